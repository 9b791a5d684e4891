//! Error types for the MemberOrder actor.

use store_actor::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MemberOrderError {
    #[error("Member order not found: {0}")]
    NotFound(String),

    /// The actor answered an action with the result of a different action.
    #[error("Unexpected reply to {0}")]
    UnexpectedReply(&'static str),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StoreError> for MemberOrderError {
    fn from(e: StoreError) -> Self {
        if let Some(inner) = e.rejection::<MemberOrderError>() {
            return inner.clone();
        }
        match e {
            StoreError::NotFound(id) => MemberOrderError::NotFound(id),
            other => MemberOrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
