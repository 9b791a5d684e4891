//! Custom actions for the MemberOrder actor.

use crate::model::{MasterOrderId, MemberStatus};

#[derive(Debug, Clone)]
pub enum MemberOrderAction {
    /// Point the order at a master order.
    LinkMaster(MasterOrderId),
    /// Clear the back-reference, but only while it still names the given master order.
    UnlinkMaster(MasterOrderId),
    /// Write a new status, optionally with a note explaining why.
    ChangeStatus {
        status: MemberStatus,
        note: Option<String>,
    },
    AddNote(String),
}

/// Results from MemberOrderActions - variants match 1:1 with MemberOrderAction
#[derive(Debug, Clone, PartialEq)]
pub enum MemberOrderActionResult {
    LinkMaster(Link),
    /// `true` if the reference was cleared.
    UnlinkMaster(bool),
    ChangeStatus(StatusChange),
    AddNote(()),
}

/// Outcome of [`MemberOrderAction::LinkMaster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Linked,
    AlreadyLinked,
    /// The order already points at another master order and was left alone.
    LinkedElsewhere(MasterOrderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: MemberStatus,
    pub to: MemberStatus,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}
