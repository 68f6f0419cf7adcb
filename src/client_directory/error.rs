use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Errors that can occur during client operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("Client not found: {0}")]
    NotFound(String),
    #[error("Client validation error: {0}")]
    ValidationFailure(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for ClientError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => ClientError::NotFound(id),
            FrameworkError::Rejected(reason) => ClientError::ValidationFailure(reason),
            other => ClientError::ActorCommunicationError(other.to_string()),
        }
    }
}
