//! Error types for the Account actor.

use store_actor::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccountError {
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Account validation error: {0}")]
    ValidationError(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        if let Some(inner) = e.rejection::<AccountError>() {
            return inner.clone();
        }
        match e {
            StoreError::NotFound(id) => AccountError::NotFound(id),
            other => AccountError::ActorCommunicationError(other.to_string()),
        }
    }
}
