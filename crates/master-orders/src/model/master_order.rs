use crate::model::{
    AccountId, LineItem, MasterOrderId, MasterStatus, MemberOrderId, OrderNote, OrderTotals,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    /// The account pays the master order.
    Central,
    /// Members already paid their own orders.
    Individual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    Unpaid,
    Paid,
}

/// Payment metadata, fixed once when the master order is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingMetadata {
    pub mode: PaymentMode,
    pub state: PaymentState,
    pub requires_manual_confirmation: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl BillingMetadata {
    /// Central payment starts unpaid and waits for a manual confirmation;
    /// individually paid accounts are settled from the start.
    pub fn for_preference(pays_centrally: bool) -> Self {
        if pays_centrally {
            Self {
                mode: PaymentMode::Central,
                state: PaymentState::Unpaid,
                requires_manual_confirmation: true,
                paid_at: None,
            }
        } else {
            Self {
                mode: PaymentMode::Individual,
                state: PaymentState::Paid,
                requires_manual_confirmation: false,
                paid_at: Some(Utc::now()),
            }
        }
    }
}

/// The consolidated order of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterOrder {
    pub id: MasterOrderId,
    pub account_id: AccountId,
    pub status: MasterStatus,
    /// Included member orders, in admission order.
    pub members: Vec<MemberOrderId>,
    /// One line per product + variation, sorted by product id.
    pub items: Vec<LineItem>,
    pub totals: OrderTotals,
    pub billing: BillingMetadata,
    pub notes: Vec<OrderNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MasterOrder {
    pub fn new(id: MasterOrderId, account_id: AccountId, billing: BillingMetadata) -> Self {
        let now = Utc::now();
        Self {
            id,
            account_id,
            status: MasterStatus::INITIAL,
            members: Vec::new(),
            items: Vec::new(),
            totals: OrderTotals::default(),
            billing,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_member(&self, member: MemberOrderId) -> bool {
        self.members.contains(&member)
    }
}

/// Payload for creating a master order.
#[derive(Debug, Clone)]
pub struct MasterOrderCreate {
    pub account_id: AccountId,
    pub billing: BillingMetadata,
}
