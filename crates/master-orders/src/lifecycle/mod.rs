//! # System Lifecycle
//!
//! Creates the record actors, wires the engine components on top of their
//! clients, and tears everything down again.
//!
//! ## Wiring
//!
//! ```text
//!  AccountActor ──► BillingPreferences ─┐
//!  RegistryActor ───────────────────────┼─► AllocationCoordinator ─┐
//!  MasterOrderActor ──┬─────────────────┘                          ├─► MembershipManager
//!  MemberOrderActor ──┴─► Builder ─────────────────────────────────┘
//!                     └─► StatusMachine ─► DocumentTrigger
//! ```
//!
//! None of the record actors depends on another, so every actor runs with a
//! `()` context and the engine components only hold clients.
//!
//! ## Graceful Shutdown
//!
//! Dropping every client closes the actor mailboxes. Each actor drains what
//! is already queued, sees its channel close, and exits; shutdown then awaits
//! the actor tasks.
//!
//! ## Observability
//!
//! [`setup_tracing`] installs the log subscriber; filter with `RUST_LOG`.

pub mod system;
pub mod tracing;

pub use system::*;
pub use tracing::*;
