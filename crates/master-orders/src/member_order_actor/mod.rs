//! # Member Order Actor
//!
//! Owns the individual customer orders. Orders are placed outside the engine;
//! the engine reads their items and writes three things through custom
//! actions: the status, the back-reference to the master order, and notes.
//!
//! ## Structure
//!
//! - [`entity`] - [`Record`](store_actor::Record) implementation for [`MemberOrder`]
//! - [`actions`] - [`MemberOrderAction`] and [`MemberOrderActionResult`]
//! - [`error`] - [`MemberOrderError`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Back-references
//!
//! `LinkMaster` never overwrites a reference to a different master order; the
//! caller has to clear a stale reference with `UnlinkMaster` first. Both
//! actions are compare-and-set on the row, so two tasks racing on the same
//! order cannot both believe they linked it.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::MemberOrderClient;
use crate::model::MemberOrder;
use store_actor::RecordActor;

/// Creates a new MemberOrder actor and its client.
pub fn new(buffer_size: usize) -> (RecordActor<MemberOrder>, MemberOrderClient) {
    let (actor, generic_client) = RecordActor::new(buffer_size);
    (actor, MemberOrderClient::new(generic_client))
}
