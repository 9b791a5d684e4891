//! # Record Clients
//!
//! Type-safe wrappers around [`RecordClient`](store_actor::RecordClient), one
//! per record actor. Each client exposes the record's actions as plain async
//! methods and maps store failures into the record's own error type.

pub mod account_client;
pub mod master_order_client;
pub mod member_order_client;
pub mod registry_client;

pub use account_client::AccountClient;
pub use master_order_client::MasterOrderClient;
pub use member_order_client::MemberOrderClient;
pub use registry_client::RegistryClient;
