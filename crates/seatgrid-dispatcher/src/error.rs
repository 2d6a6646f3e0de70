//! Dispatcher error types.

use seatgrid_model::ProxyId;
use thiserror::Error;

/// Errors that escape dispatcher operations.
///
/// Transient conditions (a lost claim race, a missed event, a single wait
/// timeout) are retried internally and never surface here.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not claim a seat for proxy {0}")]
    ProxyFailedToStart(ProxyId),

    #[error("{0} is not supported for seat-pooled proxies")]
    Unsupported(&'static str),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
