//! Error types for the Registry actor.

use crate::model::{AccountId, TxnId};
use store_actor::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("{txn} no longer holds the registry row of {account}")]
    ReservationLost { account: AccountId, txn: TxnId },

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        if let Some(inner) = e.rejection::<RegistryError>() {
            return inner.clone();
        }
        RegistryError::ActorCommunicationError(e.to_string())
    }
}
