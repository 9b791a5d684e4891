//! # Store Requests
//!
//! The messages a [`RecordClient`](crate::RecordClient) sends to a
//! [`RecordActor`](crate::RecordActor). Each variant carries a `oneshot`
//! sender for the reply.

use crate::entity::Record;
use crate::error::StoreError;
use std::fmt;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the store.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Predicate used by [`StoreRequest::Find`].
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Result of an upsert: the row as it is after the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted<T> {
    /// The key was vacant and a new row was inserted.
    Inserted(T),
    /// The key existed and `on_conflict` rewrote the row.
    Updated(T),
    /// The key existed and the row was left untouched.
    Untouched(T),
}

impl<T> Upserted<T> {
    /// True when this request wrote the row (inserted or updated).
    pub fn wrote(&self) -> bool {
        !matches!(self, Upserted::Untouched(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Upserted::Inserted(row) | Upserted::Updated(row) | Upserted::Untouched(row) => row,
        }
    }
}

/// Request sent to the store actor.
///
/// The CRUD variants map to ordinary row operations; `Upsert` is the atomic
/// insert-with-conflict-resolution statement, `Find` a predicate scan and
/// `Action` a row-specific operation defined by [`Record::Action`].
pub enum StoreRequest<T: Record> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Upsert {
        id: T::Id,
        params: T::Create,
        respond_to: Response<Upserted<T>>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Find {
        filter: Filter<T>,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

impl<T: Record> fmt::Debug for StoreRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRequest::Create { params, .. } => {
                f.debug_struct("Create").field("params", params).finish()
            }
            StoreRequest::Upsert { id, params, .. } => f
                .debug_struct("Upsert")
                .field("id", id)
                .field("params", params)
                .finish(),
            StoreRequest::Get { id, .. } => f.debug_struct("Get").field("id", id).finish(),
            StoreRequest::Find { .. } => f.write_str("Find"),
            StoreRequest::Update { id, update, .. } => f
                .debug_struct("Update")
                .field("id", id)
                .field("update", update)
                .finish(),
            StoreRequest::Delete { id, .. } => f.debug_struct("Delete").field("id", id).finish(),
            StoreRequest::Action { id, action, .. } => f
                .debug_struct("Action")
                .field("id", id)
                .field("action", action)
                .finish(),
        }
    }
}
