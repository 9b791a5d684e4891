//! # Record Trait
//!
//! The `Record` trait is the contract every stored row type (accounts, member
//! orders, master orders, registry entries, ...) implements to be managed by the
//! generic [`RecordActor`](crate::RecordActor). It names the id, the DTOs, the
//! custom actions, the injected context and the error type, and provides the
//! lifecycle hooks the actor calls while it owns the row.
//!
//! # Row Semantics
//! The actor runs `on_update` and `handle_action` against a *working copy* of
//! the row and only writes it back when the hook succeeds. A hook that returns
//! `Err` therefore never leaves a half-applied row behind, which lets records
//! validate-and-mutate in a single hook without worrying about undo.
//!
//! # Upserts
//! [`Record::on_conflict`] is the conflict clause of an atomic
//! insert-or-resolve request. The default leaves the existing row untouched,
//! the equivalent of `ON CONFLICT DO NOTHING`.

use async_trait::async_trait;
use std::fmt::{Debug, Display};

/// What an upsert did to an already-present row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// The existing row was rewritten by `on_conflict`.
    Updated,
    /// The existing row was left as it was.
    Untouched,
}

/// Trait that any stored row type must implement to be managed by `RecordActor`.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they can call other actors through the
/// injected `Context`. The context is passed to `run()`, not `new()`, so actors
/// can be wired together after they have all been constructed.
#[async_trait]
pub trait Record: Clone + Send + Sync + 'static {
    /// Key of the row. Ordered so queries come back in a stable order, and
    /// convertible from `u64` for automatically assigned ids.
    type Id: Ord + Clone + Send + Sync + Display + Debug + From<u64>;

    /// The data required to insert a new row.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing row.
    type Update: Send + Sync + Debug;

    /// Row-specific operations (e.g. `Transition`, `LinkMaster`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// One error enum per record type; every hook reports through it.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build the row from its key and insert payload.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called after the row is built and before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Apply an update DTO to the (working copy of the) row.
    async fn on_update(&mut self, update: Self::Update, _ctx: &Self::Context)
        -> Result<(), Self::Error>;

    /// Called immediately before the row is removed. Returning `Err` vetoes the delete.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Resolve an upsert that hit an existing key.
    async fn on_conflict(
        &mut self,
        _params: Self::Create,
        _ctx: &Self::Context,
    ) -> Result<Conflict, Self::Error> {
        Ok(Conflict::Untouched)
    }

    /// Handle a row-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
