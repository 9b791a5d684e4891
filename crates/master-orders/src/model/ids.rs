//! Type-safe identifiers.
//!
//! Every id is a `u64` newtype so an account id can never be handed to a call
//! that expects a master order id. `Display` renders the prefixed form used in
//! logs and notes (`account_3`, `order_12`, `master_1`).

use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Organisational account (school).
    AccountId,
    "account"
);
define_id!(
    /// Individual customer order.
    MemberOrderId,
    "order"
);
define_id!(
    /// Consolidated order for one account.
    MasterOrderId,
    "master"
);
define_id!(ProductId, "product");
define_id!(
    /// Product variation; `VariationId(0)` is the plain product.
    VariationId,
    "variation"
);
define_id!(TaxRateId, "tax_rate");
define_id!(
    /// Allocation transaction token held in a registry reservation.
    TxnId,
    "txn"
);
