//! Error types for the MasterOrder actor.

use crate::error::InvalidTransitionError;
use crate::model::{MasterOrderId, MasterStatus, MemberOrderId};
use store_actor::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MasterOrderError {
    #[error("Master order not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    /// Membership is frozen once the master order left its initial status.
    #[error("{master} is {status} and no longer accepts membership changes")]
    NotAccepting {
        master: MasterOrderId,
        status: MasterStatus,
    },

    /// A rebuild was computed from a membership list that has since changed.
    #[error("Membership of {master} changed while it was being rebuilt")]
    MembershipChanged { master: MasterOrderId },

    #[error("{member} is not a member of {master}")]
    NotAMember {
        master: MasterOrderId,
        member: MemberOrderId,
    },

    #[error("{master} still has {members} member order(s)")]
    StillInUse { master: MasterOrderId, members: usize },

    #[error("Unexpected reply to {0}")]
    UnexpectedReply(&'static str),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl MasterOrderError {
    /// The master order is gone or sealed, so a fresh allocation may succeed.
    pub fn is_stale_target(&self) -> bool {
        matches!(
            self,
            MasterOrderError::NotFound(_) | MasterOrderError::NotAccepting { .. }
        )
    }
}

impl From<StoreError> for MasterOrderError {
    fn from(e: StoreError) -> Self {
        if let Some(inner) = e.rejection::<MasterOrderError>() {
            return inner.clone();
        }
        match e {
            StoreError::NotFound(id) => MasterOrderError::NotFound(id),
            other => MasterOrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
