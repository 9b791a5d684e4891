//! # Engine Errors
//!
//! The aggregation engine's error taxonomy. Only failures that abort an
//! operation travel as [`EngineError`]; informational results (a refused
//! removal, a skipped reconstruction line) are reported through outcome types
//! that carry the error values below.

use crate::account_actor::AccountError;
use crate::locks::LockTimeout;
use crate::master_order_actor::MasterOrderError;
use crate::member_order_actor::MemberOrderError;
use crate::model::{
    AccountId, MasterOrderId, MasterStatus, MemberOrderId, ProductId, TxnId, VariationId,
};
use crate::registry_actor::RegistryError;
use std::time::Duration;
use thiserror::Error;

/// Failure to get or create the active master order of an account.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AllocationError {
    /// The per-account allocation lock was not acquired in time.
    #[error("Timed out after {waited:?} waiting for the allocation lock of {account}")]
    LockTimeout { account: AccountId, waited: Duration },

    /// Another transaction kept the registry row reserved past the deadline.
    #[error("Registry row of {account} is still held by {holder}")]
    RowLocked { account: AccountId, holder: TxnId },

    /// Storage failed; the reservation was rolled back.
    #[error("Allocation for {account} failed and was rolled back: {reason}")]
    Storage { account: AccountId, reason: String },
}

impl AllocationError {
    /// Lock contention is worth retrying later; storage failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AllocationError::LockTimeout { .. } | AllocationError::RowLocked { .. }
        )
    }
}

/// A master order status change that the transition table forbids.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{master} cannot move from {from} to {to}")]
pub struct InvalidTransitionError {
    pub master: MasterOrderId,
    pub from: MasterStatus,
    pub to: MasterStatus,
}

/// A line or member that could not be folded into a rebuilt master order.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconstructionError {
    #[error("{product}/{variation} of {member} no longer resolves to a product")]
    UnresolvableProduct {
        member: MemberOrderId,
        product: ProductId,
        variation: VariationId,
    },

    #[error("{0} no longer exists")]
    MissingMember(MemberOrderId),
}

/// A removal that was refused because the master order already progressed.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{member} stays in {master}: the master order is already {status}")]
pub struct RemovalRefusedError {
    pub member: MemberOrderId,
    pub master: MasterOrderId,
    pub status: MasterStatus,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    /// A member or master order lock could not be taken in time.
    #[error(transparent)]
    Busy(#[from] LockTimeout),

    #[error("Member order {0} not found")]
    MemberNotFound(MemberOrderId),

    #[error("Master order {0} not found")]
    MasterNotFound(MasterOrderId),

    #[error(transparent)]
    MemberOrder(#[from] MemberOrderError),

    #[error(transparent)]
    MasterOrder(#[from] MasterOrderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Account(#[from] AccountError),
}

impl EngineError {
    /// Whether retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Allocation(e) => e.is_retryable(),
            EngineError::Busy(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_contention_is_retryable_storage_is_not() {
        let timeout = AllocationError::LockTimeout {
            account: AccountId(1),
            waited: Duration::from_millis(10),
        };
        let storage = AllocationError::Storage {
            account: AccountId(1),
            reason: "store closed".into(),
        };
        assert!(EngineError::from(timeout).is_retryable());
        assert!(!EngineError::from(storage).is_retryable());
    }

    #[test]
    fn messages_name_the_orders() {
        let refused = RemovalRefusedError {
            member: MemberOrderId(4),
            master: MasterOrderId(2),
            status: MasterStatus::Warehouse,
        };
        assert_eq!(
            refused.to_string(),
            "order_4 stays in master_2: the master order is already warehouse"
        );
    }
}
