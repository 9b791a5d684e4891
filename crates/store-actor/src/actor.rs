//! # Record Actor
//!
//! The `RecordActor` is the server half of the store. It owns every row of one
//! record type and processes [`StoreRequest`]s strictly one at a time, which
//! gives each request the isolation of a single-statement transaction: no other
//! request can observe or modify the table while a hook is running.

use crate::client::RecordClient;
use crate::entity::{Conflict, Record};
use crate::error::StoreError;
use crate::message::{StoreRequest, Upserted};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that owns a table of `T` rows.
///
/// **Concurrency model**: each actor runs in its own Tokio task and drains its
/// channel sequentially, so the `store` needs no `Mutex`. Many actors (one per
/// record type) run in parallel.
///
/// # Operations
///
/// * **Create**: assigns the next free `u64` id, builds the row with
///   `from_create_params`, runs `on_create`, inserts.
/// * **Upsert**: inserts under the given key when it is vacant; otherwise runs
///   `on_conflict` on a working copy and keeps it only for `Conflict::Updated`.
/// * **Get / Find**: clones the matching rows; `Find` returns them in key order.
/// * **Update / Action**: runs the hook on a working copy and writes it back on
///   success only. A failing hook leaves the stored row unchanged.
/// * **Delete**: runs `on_delete` (which may veto) and removes the row.
///
/// ```rust
/// use store_actor::{Record, RecordActor};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Counter { id: u64, value: u32 }
/// #[derive(Debug)] struct CounterCreate;
/// #[derive(Debug)] struct CounterUpdate(u32);
/// #[derive(Debug)] enum CounterAction {}
/// #[derive(Debug, thiserror::Error)] #[error("counter error")] struct CounterError;
///
/// #[async_trait]
/// impl Record for Counter {
///     type Id = u64;
///     type Create = CounterCreate;
///     type Update = CounterUpdate;
///     type Action = CounterAction;
///     type ActionResult = ();
///     type Context = ();
///     type Error = CounterError;
///
///     fn from_create_params(id: u64, _: CounterCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id, value: 0 })
///     }
///     async fn on_update(&mut self, update: CounterUpdate, _: &()) -> Result<(), Self::Error> {
///         self.value = update.0;
///         Ok(())
///     }
///     async fn handle_action(&mut self, _: CounterAction, _: &()) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = RecordActor::<Counter>::new(10);
///     tokio::spawn(actor.run(()));
///
///     let id = client.create(CounterCreate).await.unwrap();
///     let row = client.update(id, CounterUpdate(3)).await.unwrap();
///     assert_eq!(row.value, 3);
/// }
/// ```
pub struct RecordActor<T: Record> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    store: BTreeMap<T::Id, T>,
    next_id: u64,
}

impl<T: Record> RecordActor<T> {
    /// Creates a new `RecordActor` and its associated `RecordClient`.
    ///
    /// `buffer_size` is the capacity of the request channel; when it is full,
    /// client calls wait for space.
    pub fn new(buffer_size: usize) -> (Self, RecordClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            next_id: 1,
        };
        (actor, RecordClient::new(sender))
    }

    fn allocate_id(&mut self) -> T::Id {
        loop {
            let id = T::Id::from(self.next_id);
            self.next_id += 1;
            if !self.store.contains_key(&id) {
                return id;
            }
        }
    }

    /// Runs the request loop until every client has been dropped.
    ///
    /// The `context` is handed to every hook, so records can reach other
    /// actors that were created after this one.
    pub async fn run(mut self, context: T::Context) {
        let record_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(record_type, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Create { params, respond_to } => {
                    debug!(record_type, ?params, "Create");
                    let id = self.allocate_id();
                    let result = match T::from_create_params(id.clone(), params) {
                        Ok(mut row) => match row.on_create(&context).await {
                            Ok(()) => {
                                self.store.insert(id.clone(), row);
                                info!(record_type, %id, size = self.store.len(), "Created");
                                Ok(id)
                            }
                            Err(e) => {
                                warn!(record_type, error = %e, "on_create failed");
                                Err(StoreError::Rejected(Box::new(e)))
                            }
                        },
                        Err(e) => {
                            warn!(record_type, error = %e, "Create failed");
                            Err(StoreError::Rejected(Box::new(e)))
                        }
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Upsert {
                    id,
                    params,
                    respond_to,
                } => {
                    debug!(record_type, %id, ?params, "Upsert");
                    let result = match self.store.get_mut(&id) {
                        Some(row) => {
                            let mut working = row.clone();
                            match working.on_conflict(params, &context).await {
                                Ok(Conflict::Updated) => {
                                    *row = working.clone();
                                    info!(record_type, %id, "Upsert updated");
                                    Ok(Upserted::Updated(working))
                                }
                                Ok(Conflict::Untouched) => {
                                    debug!(record_type, %id, "Upsert untouched");
                                    Ok(Upserted::Untouched(row.clone()))
                                }
                                Err(e) => {
                                    warn!(record_type, %id, error = %e, "on_conflict failed");
                                    Err(StoreError::Rejected(Box::new(e)))
                                }
                            }
                        }
                        None => match T::from_create_params(id.clone(), params) {
                            Ok(mut row) => match row.on_create(&context).await {
                                Ok(()) => {
                                    self.store.insert(id.clone(), row.clone());
                                    info!(record_type, %id, size = self.store.len(), "Upsert inserted");
                                    Ok(Upserted::Inserted(row))
                                }
                                Err(e) => {
                                    warn!(record_type, %id, error = %e, "on_create failed");
                                    Err(StoreError::Rejected(Box::new(e)))
                                }
                            },
                            Err(e) => {
                                warn!(record_type, %id, error = %e, "Upsert failed");
                                Err(StoreError::Rejected(Box::new(e)))
                            }
                        },
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Get { id, respond_to } => {
                    let row = self.store.get(&id).cloned();
                    debug!(record_type, %id, found = row.is_some(), "Get");
                    let _ = respond_to.send(Ok(row));
                }
                StoreRequest::Find { filter, respond_to } => {
                    let rows: Vec<T> = self
                        .store
                        .values()
                        .filter(|row| filter(row))
                        .cloned()
                        .collect();
                    debug!(record_type, matched = rows.len(), "Find");
                    let _ = respond_to.send(Ok(rows));
                }
                StoreRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(record_type, %id, ?update, "Update");
                    let result = match self.store.get_mut(&id) {
                        Some(row) => {
                            let mut working = row.clone();
                            match working.on_update(update, &context).await {
                                Ok(()) => {
                                    *row = working.clone();
                                    info!(record_type, %id, "Updated");
                                    Ok(working)
                                }
                                Err(e) => {
                                    warn!(record_type, %id, error = %e, "Update rolled back");
                                    Err(StoreError::Rejected(Box::new(e)))
                                }
                            }
                        }
                        None => {
                            warn!(record_type, %id, "Not found");
                            Err(StoreError::NotFound(id.to_string()))
                        }
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete { id, respond_to } => {
                    debug!(record_type, %id, "Delete");
                    let result = match self.store.get(&id) {
                        Some(row) => match row.on_delete(&context).await {
                            Ok(()) => {
                                self.store.remove(&id);
                                info!(record_type, %id, size = self.store.len(), "Deleted");
                                Ok(())
                            }
                            Err(e) => {
                                warn!(record_type, %id, error = %e, "on_delete vetoed");
                                Err(StoreError::Rejected(Box::new(e)))
                            }
                        },
                        None => {
                            warn!(record_type, %id, "Not found");
                            Err(StoreError::NotFound(id.to_string()))
                        }
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(record_type, %id, ?action, "Action");
                    let result = match self.store.get_mut(&id) {
                        Some(row) => {
                            let mut working = row.clone();
                            match working.handle_action(action, &context).await {
                                Ok(outcome) => {
                                    *row = working;
                                    info!(record_type, %id, "Action ok");
                                    Ok(outcome)
                                }
                                Err(e) => {
                                    warn!(record_type, %id, error = %e, "Action rolled back");
                                    Err(StoreError::Rejected(Box::new(e)))
                                }
                            }
                        }
                        None => {
                            warn!(record_type, %id, "Not found");
                            Err(StoreError::NotFound(id.to_string()))
                        }
                    };
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(record_type, size = self.store.len(), "Shutdown");
    }
}
