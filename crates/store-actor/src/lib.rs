//! # Store Actor
//!
//! A small, typed record store built on the actor model. Each record type gets
//! its own [`RecordActor`], a Tokio task that owns the rows and applies requests
//! one at a time, and any number of cloneable [`RecordClient`]s that talk to it
//! over a channel.
//!
//! ## Why an actor per table?
//!
//! Sequential processing is what a row lock buys in a database: while a request
//! runs, nobody else reads or writes the table. That makes three things cheap:
//!
//! - **Atomic statements**: [`RecordClient::upsert`] is a single request, so
//!   "insert unless an active row exists" cannot race with itself.
//! - **Rollback on failure**: update and action hooks run on a working copy
//!   that is only written back when the hook succeeds.
//! - **Validate-and-write**: a record can check an invariant and mutate itself
//!   in the same hook without any other writer slipping in between.
//!
//! ## Layers
//!
//! 1. **Record layer** ([`Record`]): the row type, its DTOs, actions and hooks.
//! 2. **Runtime layer** ([`RecordActor`]): the request loop.
//! 3. **Interface layer** ([`RecordClient`], [`StoreClient`]): typed requests.
//!
//! ## Context Injection
//!
//! Dependencies are injected through `run(context)` rather than `new()`, so a
//! set of actors can be constructed first and wired to each other afterwards.
//!
//! ## Testing
//!
//! [`mock::MockClient`] serves scripted replies through a real `RecordClient`,
//! which makes storage failures easy to inject.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::RecordActor;
pub use client::RecordClient;
pub use client_trait::StoreClient;
pub use entity::{Conflict, Record};
pub use error::StoreError;
pub use message::{Filter, Response, StoreRequest, Upserted};
