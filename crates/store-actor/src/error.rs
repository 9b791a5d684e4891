//! # Store Errors
//!
//! Errors raised by the record store itself, independent of any record type.
//! Record-specific failures travel inside [`StoreError::Rejected`] and can be
//! recovered with [`StoreError::rejection`].

/// Errors that can occur while talking to a [`RecordActor`](crate::RecordActor).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Record rejected the request: {0}")]
    Rejected(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Returns the record's own error if this is a [`StoreError::Rejected`]
    /// carrying an error of type `E`.
    pub fn rejection<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            StoreError::Rejected(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Whether the failure came from the channel plumbing rather than the record.
    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::ActorClosed | StoreError::ActorDropped)
    }
}
