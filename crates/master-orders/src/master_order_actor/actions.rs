//! Custom actions for the MasterOrder actor.

use crate::model::{AccountId, LineItem, MasterStatus, MemberOrderId, OrderTotals};

#[derive(Debug, Clone)]
pub enum MasterOrderAction {
    /// Fold a member's lines into the master order and record the member.
    Merge {
        member: MemberOrderId,
        items: Vec<LineItem>,
    },
    /// Replace the lines with a rebuild computed from `members`.
    Rebuild {
        members: Vec<MemberOrderId>,
        items: Vec<LineItem>,
    },
    DropMember(MemberOrderId),
    Transition(MasterStatus),
    AddNote(String),
    /// Record the manual payment confirmation of a centrally paid order.
    ConfirmPayment,
}

/// Results from MasterOrderActions - variants match 1:1 with MasterOrderAction
#[derive(Debug, Clone, PartialEq)]
pub enum MasterOrderActionResult {
    Merge(Merged),
    Rebuild(OrderTotals),
    /// The members left after the drop, in admission order.
    DropMember(Vec<MemberOrderId>),
    Transition(TransitionRecord),
    AddNote(()),
    /// `true` if the order went from unpaid to paid.
    ConfirmPayment(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Merged {
    /// The member was added; carries the new totals.
    Added(OrderTotals),
    AlreadyPresent,
}

/// A status write as the actor applied it, with a snapshot of the row taken
/// in the same step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    pub account_id: AccountId,
    pub from: MasterStatus,
    pub to: MasterStatus,
    pub members: Vec<MemberOrderId>,
}

impl TransitionRecord {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}
