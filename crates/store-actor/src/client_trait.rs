//! # StoreClient Trait
//!
//! Common surface for record-specific clients: default `fetch`, `list` and
//! `remove` built on the wrapped [`RecordClient`], with store errors mapped into
//! the record's own error type.
use crate::{Record, RecordClient, StoreError};
use async_trait::async_trait;

/// Trait for record-specific clients to inherit the standard read/delete operations.
///
/// ```rust
/// use store_actor::{Record, RecordClient, StoreClient, StoreError};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Note { id: u64 }
/// #[derive(Debug)] struct NoteCreate;
/// #[derive(Debug)] enum NoteAction {}
/// #[derive(Debug, thiserror::Error)] #[error("{0}")] struct NoteError(String);
///
/// #[async_trait]
/// impl Record for Note {
///     type Id = u64;
///     type Create = NoteCreate;
///     type Update = ();
///     type Action = NoteAction;
///     type ActionResult = ();
///     type Context = ();
///     type Error = NoteError;
///
///     fn from_create_params(id: u64, _: NoteCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
///     async fn on_update(&mut self, _: (), _: &()) -> Result<(), Self::Error> { Ok(()) }
///     async fn handle_action(&mut self, _: NoteAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
/// }
///
/// struct NoteClient { inner: RecordClient<Note> }
///
/// #[async_trait]
/// impl StoreClient<Note> for NoteClient {
///     type Error = NoteError;
///     fn inner(&self) -> &RecordClient<Note> { &self.inner }
///     fn map_error(e: StoreError) -> NoteError { NoteError(e.to_string()) }
/// }
///
/// async fn usage(client: NoteClient) {
///     // fetch(), list() and remove() come for free
///     let _ = client.fetch(1).await;
///     let _ = client.remove(1).await;
/// }
/// ```
#[async_trait]
pub trait StoreClient<T: Record>: Send + Sync {
    /// The record-specific error type.
    type Error: Send + Sync;

    /// Access the wrapped generic client.
    fn inner(&self) -> &RecordClient<T>;

    /// Map store errors to the record-specific error type.
    fn map_error(e: StoreError) -> Self::Error;

    /// Fetch a row by id.
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// All rows matching `filter`, in key order.
    async fn list<F>(&self, filter: F) -> Result<Vec<T>, Self::Error>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.inner().find(filter).await.map_err(Self::map_error)
    }

    /// Delete a row by id.
    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }
}
