//! # Registry Actor
//!
//! One row per account naming its active master order. The row doubles as the
//! account's allocation lock: an allocation first *reserves* the row for its
//! transaction through an atomic upsert, creates the master order, and then
//! *binds* it. Until it binds or aborts, every other transaction sees the row
//! as held.
//!
//! ```text
//!  (none) ──reserve──► held(txn) ──bind──► active(master)
//!                         │                    │
//!                       abort                retire
//!                         ▼                    ▼
//!                     inactive ◄───────────────┘
//!                         │
//!                      reserve
//!                         ▼
//!                     held(txn')
//! ```
//!
//! Reserving only succeeds on a missing or inactive row; on an active row the
//! upsert leaves the row untouched and the caller re-reads it. `Bind`, `Abort`
//! and `Retire` are compare-and-set: they only act on the row they expect.

pub mod entity;
pub mod error;

pub use entity::RegistryAction;
pub use error::*;

use crate::clients::RegistryClient;
use crate::model::RegistryEntry;
use store_actor::RecordActor;

/// Creates a new Registry actor and its client.
pub fn new(buffer_size: usize) -> (RecordActor<RegistryEntry>, RegistryClient) {
    let (actor, generic_client) = RecordActor::new(buffer_size);
    (actor, RegistryClient::new(generic_client))
}
