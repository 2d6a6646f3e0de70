//! Model error types.

use thiserror::Error;

/// Errors raised by the domain model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown runtime value key: {0}")]
    UnknownRuntimeValueKey(String),

    #[error("conflicting registration for runtime value key: {0}")]
    ConflictingRuntimeValueKey(&'static str),

    #[error("missing runtime value: {0}")]
    MissingRuntimeValue(&'static str),

    #[error("runtime value {0} could not be decoded from {1:?}")]
    UndecodableRuntimeValue(&'static str, String),
}

pub type ModelResult<T> = Result<T, ModelError>;
