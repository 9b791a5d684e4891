use crate::model::{AccountId, LineItem, MasterOrderId, MemberOrderId, MemberStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A human-readable note attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNote {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl OrderNote {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

/// An individual customer order.
///
/// Created outside the engine. The engine only reads its items and writes its
/// status, its master back-reference and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberOrder {
    pub id: MemberOrderId,
    pub account_id: Option<AccountId>,
    pub items: Vec<LineItem>,
    pub status: MemberStatus,
    /// The master order this order was merged into.
    pub master_order: Option<MasterOrderId>,
    pub merged_at: Option<DateTime<Utc>>,
    pub notes: Vec<OrderNote>,
}

impl MemberOrder {
    pub fn new(
        id: MemberOrderId,
        account_id: Option<AccountId>,
        items: Vec<LineItem>,
        status: MemberStatus,
    ) -> Self {
        Self {
            id,
            account_id,
            items,
            status,
            master_order: None,
            merged_at: None,
            notes: Vec::new(),
        }
    }

    pub fn is_linked_to(&self, master: MasterOrderId) -> bool {
        self.master_order == Some(master)
    }
}

/// Payload for placing a member order.
#[derive(Debug, Clone)]
pub struct MemberOrderCreate {
    pub account_id: Option<AccountId>,
    pub items: Vec<LineItem>,
    pub status: MemberStatus,
}
