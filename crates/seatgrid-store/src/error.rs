//! Store error types.

use seatgrid_model::DelegateProxyId;
use thiserror::Error;

/// Errors raised by the shared-state stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("delegate proxy not found: {0}")]
    DelegateMissing(DelegateProxyId),

    #[error("targets of ready delegate proxy {0} cannot change")]
    DelegateTargetsImmutable(DelegateProxyId),
}

pub type StoreResult<T> = Result<T, StoreError>;
