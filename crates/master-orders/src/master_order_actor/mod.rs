//! # Master Order Actor
//!
//! Owns the consolidated master orders. Every change the engine makes to a
//! master order is a single custom action, so the actor's sequential mailbox
//! is what keeps one master order consistent under concurrent callers:
//!
//! - `Merge` folds a member's lines in and records the member, or does nothing
//!   if the member is already listed.
//! - `Rebuild` replaces the lines, but only if the membership list is still the
//!   one the caller rebuilt from.
//! - `DropMember` removes a member id and returns who is left.
//! - `Transition` checks the status table and writes the new status, or
//!   rejects the change and leaves the row untouched.
//!
//! All membership-changing actions are refused once the master order has left
//! its initial status.
//!
//! ## Structure
//!
//! - [`entity`] - [`Record`](store_actor::Record) implementation for [`MasterOrder`]
//! - [`actions`] - [`MasterOrderAction`] and [`MasterOrderActionResult`]
//! - [`error`] - [`MasterOrderError`]
//! - [`new()`] - Factory function that creates the actor and client

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::MasterOrderClient;
use crate::model::MasterOrder;
use store_actor::RecordActor;

/// Creates a new MasterOrder actor and its client.
pub fn new(buffer_size: usize) -> (RecordActor<MasterOrder>, MasterOrderClient) {
    let (actor, generic_client) = RecordActor::new(buffer_size);
    (actor, MasterOrderClient::new(generic_client))
}
