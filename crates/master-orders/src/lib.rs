//! # Master Orders
//!
//! Consolidates the individual orders of an account (a school, say) into a
//! single master order that is picked, packed and shipped as one.
//!
//! ## Core Components
//!
//! - **[model]**: The rows: [`Account`](model::Account), [`MemberOrder`](model::MemberOrder),
//!   [`MasterOrder`](model::MasterOrder) and [`RegistryEntry`](model::RegistryEntry).
//! - **Record actors** ([`account_actor`], [`member_order_actor`],
//!   [`master_order_actor`], [`registry_actor`]): each owns one kind of row and
//!   applies changes to it one request at a time.
//! - **[clients]**: Typed wrappers that hide the message passing.
//! - **[allocation]**: At most one active master order per account.
//! - **[builder]**: Keeps master order lines equal to the sum of its members.
//! - **[status_machine]** and **[documents]**: Master order statuses and their
//!   effect on members.
//! - **[membership]**: Admission and removal of member orders.
//! - **[lifecycle]**: Starts, wires and stops all of the above.
//!
//! ## Quick Start
//!
//! ```rust
//! use master_orders::lifecycle::AggregationSystem;
//! use master_orders::model::{AccountCreate, LineItem, MemberOrderCreate, MemberStatus, ProductId};
//! use master_orders::membership::{AdmitOutcome, MembershipChange};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = AggregationSystem::new();
//!
//!     let school = system
//!         .accounts
//!         .create_account(AccountCreate { name: "Lindenhof Primary".into(), pays_centrally: true })
//!         .await?;
//!     let order = system
//!         .member_orders
//!         .place_order(MemberOrderCreate {
//!             account_id: Some(school),
//!             items: vec![LineItem::new(ProductId(7), "Workbook", 2, Decimal::new(450, 2))],
//!             status: MemberStatus::Pending,
//!         })
//!         .await?;
//!
//!     let change = system.set_member_status(order, MemberStatus::Processing, None).await?;
//!     assert!(matches!(change, MembershipChange::Admit(AdmitOutcome::Admitted { .. })));
//!
//!     system.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod account_actor;
pub mod allocation;
pub mod builder;
pub mod clients;
pub mod config;
pub mod documents;
pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod master_order_actor;
pub mod member_order_actor;
pub mod membership;
pub mod model;
pub mod notify;
pub mod registry_actor;
pub mod status_machine;

pub use config::{EngineConfig, TerminalPropagation};
pub use error::EngineError;
pub use lifecycle::AggregationSystem;
