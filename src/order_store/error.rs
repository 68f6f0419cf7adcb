use thiserror::Error;

use crate::client_directory::ClientError;
use crate::lifecycle::InvalidTransition;
use crate::sequencer::LookupFailure;

/// Errors that can occur during order operations. Each is scoped to the one
/// request that raised it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error(transparent)]
    LookupFailure(#[from] LookupFailure),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("Too many submissions from {key}, retry in {retry_after_secs}s")]
    RateLimited { key: String, retry_after_secs: i64 },
    #[error("Order validation error: {0}")]
    ValidationFailure(String),
    #[error("Order not found: {0}")]
    NotFound(u64),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<ClientError> for OrderError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::ValidationFailure(reason) => OrderError::ValidationFailure(reason),
            ClientError::NotFound(id) => OrderError::ValidationFailure(format!("unknown client {id}")),
            ClientError::ActorCommunicationError(reason) => OrderError::ActorCommunicationError(reason),
        }
    }
}
