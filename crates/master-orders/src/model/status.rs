//! Member and master order statuses.
//!
//! ```text
//!   Validated ──► Warehouse ◄──► Prepared
//!                     │              │
//!                     └──► Complete ◄┘
//! ```
//!
//! `Validated` is left only towards `Warehouse` and is never re-entered.
//! `Complete` is terminal.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Status of an individual (member) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberStatus {
    Pending,
    OnHold,
    Processing,
    Reviewed,
    Warehouse,
    Prepared,
    Completed,
    Cancelled,
    Failed,
    Refunded,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 10] = [
        MemberStatus::Pending,
        MemberStatus::OnHold,
        MemberStatus::Processing,
        MemberStatus::Reviewed,
        MemberStatus::Warehouse,
        MemberStatus::Prepared,
        MemberStatus::Completed,
        MemberStatus::Cancelled,
        MemberStatus::Failed,
        MemberStatus::Refunded,
    ];

    /// Statuses in which an order may be merged into a master order.
    pub fn is_admissible(self) -> bool {
        matches!(self, MemberStatus::Processing | MemberStatus::Reviewed)
    }

    /// Cancelled, failed or refunded: contributes nothing to a master order.
    pub fn is_void(self) -> bool {
        matches!(
            self,
            MemberStatus::Cancelled | MemberStatus::Failed | MemberStatus::Refunded
        )
    }

    /// Position along the fulfilment path; `None` for void statuses.
    pub fn fulfilment_rank(self) -> Option<u8> {
        match self {
            MemberStatus::Pending | MemberStatus::OnHold => Some(0),
            MemberStatus::Processing | MemberStatus::Reviewed => Some(1),
            MemberStatus::Warehouse => Some(2),
            MemberStatus::Prepared => Some(3),
            MemberStatus::Completed => Some(4),
            MemberStatus::Cancelled | MemberStatus::Failed | MemberStatus::Refunded => None,
        }
    }

    /// True when the order is still short of `target` on the fulfilment path.
    /// Void orders are never behind anything.
    pub fn is_behind(self, target: MemberStatus) -> bool {
        match (self.fulfilment_rank(), target.fulfilment_rank()) {
            (Some(own), Some(target)) => own < target,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Pending => "pending",
            MemberStatus::OnHold => "on-hold",
            MemberStatus::Processing => "processing",
            MemberStatus::Reviewed => "reviewed",
            MemberStatus::Warehouse => "warehouse",
            MemberStatus::Prepared => "prepared",
            MemberStatus::Completed => "completed",
            MemberStatus::Cancelled => "cancelled",
            MemberStatus::Failed => "failed",
            MemberStatus::Refunded => "refunded",
        }
    }
}

impl Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemberStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Status of a master order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MasterStatus {
    /// Initial: accepting members, contents follow membership.
    Validated,
    /// In progress: packing slips printed, goods being picked.
    Warehouse,
    /// In progress: picked and packed.
    Prepared,
    /// Terminal.
    Complete,
}

impl MasterStatus {
    pub const INITIAL: MasterStatus = MasterStatus::Validated;

    pub fn is_initial(self) -> bool {
        self == MasterStatus::Validated
    }

    pub fn is_terminal(self) -> bool {
        self == MasterStatus::Complete
    }

    /// The transition table. Staying in the same status is not a transition.
    pub fn can_transition_to(self, next: MasterStatus) -> bool {
        use MasterStatus::*;
        matches!(
            (self, next),
            (Validated, Warehouse)
                | (Warehouse, Prepared)
                | (Prepared, Warehouse)
                | (Warehouse, Complete)
                | (Prepared, Complete)
        )
    }

    /// True when moving from `self` to `next` is forbidden. Staying put is
    /// allowed except in the terminal status, which accepts nothing.
    pub fn is_regression(self, next: MasterStatus) -> bool {
        if self.is_terminal() {
            return true;
        }
        self != next && !self.can_transition_to(next)
    }

    /// The member status a master status mirrors onto its members, if any.
    pub fn mirrored_member_status(self) -> Option<MemberStatus> {
        match self {
            MasterStatus::Validated => None,
            MasterStatus::Warehouse => Some(MemberStatus::Warehouse),
            MasterStatus::Prepared => Some(MemberStatus::Prepared),
            MasterStatus::Complete => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MasterStatus::Validated => "validated",
            MasterStatus::Warehouse => "warehouse",
            MasterStatus::Prepared => "prepared",
            MasterStatus::Complete => "complete",
        }
    }
}

impl Display for MasterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasterStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            MasterStatus::Validated,
            MasterStatus::Warehouse,
            MasterStatus::Prepared,
            MasterStatus::Complete,
        ]
        .into_iter()
        .find(|status| status.as_str() == s)
        .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);
