use crate::model::{AccountId, MasterOrderId, TxnId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per account: which master order is currently active for it.
///
/// A row with `active == true` and a `reservation` but no `master_order` is a
/// placeholder: an allocation transaction has claimed the account and is
/// creating the master order. While that reservation is held the row counts as
/// locked for every other transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub account_id: AccountId,
    pub master_order: Option<MasterOrderId>,
    pub active: bool,
    pub reservation: Option<TxnId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistryEntry {
    pub fn reserved(account_id: AccountId, txn: TxnId) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            master_order: None,
            active: true,
            reservation: Some(txn),
            created_at: now,
            updated_at: now,
        }
    }

    /// The active, fully allocated master order, if any.
    pub fn active_master(&self) -> Option<MasterOrderId> {
        if self.active && self.reservation.is_none() {
            self.master_order
        } else {
            None
        }
    }

    /// The transaction currently holding this row, if any.
    pub fn held_by(&self) -> Option<TxnId> {
        if self.active {
            self.reservation
        } else {
            None
        }
    }
}

/// Upsert payload: reserve the account for `txn`.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub txn: TxnId,
}
