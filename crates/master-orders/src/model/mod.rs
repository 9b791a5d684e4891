//! Pure data structures: the rows the record actors own and the DTOs used to
//! create and change them.

pub mod account;
pub mod ids;
pub mod line_item;
pub mod master_order;
pub mod member_order;
pub mod registry;
pub mod status;

pub use account::*;
pub use ids::*;
pub use line_item::*;
pub use master_order::*;
pub use member_order::*;
pub use registry::*;
pub use status::*;
