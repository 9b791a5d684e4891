//! # Account Actor
//!
//! Owns the account rows. Accounts are read-only for the engine; only their
//! billing preference matters, which decides how a new master order is paid.
//!
//! ## Structure
//!
//! - [`entity`] - [`Record`](store_actor::Record) implementation for [`Account`]
//! - [`error`] - [`AccountError`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust
//! use master_orders::account_actor;
//! use master_orders::model::AccountCreate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, client) = account_actor::new(32);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client
//!         .create_account(AccountCreate {
//!             name: "Lindenhof Primary".to_string(),
//!             pays_centrally: true,
//!         })
//!         .await?;
//!     assert!(client.pays_centrally(id).await?);
//!     Ok(())
//! }
//! ```

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::AccountClient;
use crate::model::Account;
use store_actor::RecordActor;

/// Creates a new Account actor and its client.
pub fn new(buffer_size: usize) -> (RecordActor<Account>, AccountClient) {
    let (actor, generic_client) = RecordActor::new(buffer_size);
    (actor, AccountClient::new(generic_client))
}
