//! # Status Machine
//!
//! Moves master orders through `validated → warehouse ⇄ prepared → complete`
//! and mirrors each move onto the member orders.
//!
//! The master order actor validates and writes the status in one step, so a
//! forbidden change never reaches the row. A rejected change is not silent:
//! it is logged, noted on the master order and reported to the notification
//! sink before the [`InvalidTransitionError`] is returned.
//!
//! ## Modes
//!
//! [`TransitionMode::Standard`] transitions publish a [`MasterStatusChanged`]
//! event to subscribers. [`TransitionMode::System`] transitions, used by
//! engine-internal triggers such as a printed packing slip, perform the same
//! write and propagation without publishing. Member status writes made during
//! propagation never go back through the membership manager.

use crate::clients::{MasterOrderClient, MemberOrderClient, RegistryClient};
use crate::config::{EngineConfig, TerminalPropagation};
use crate::error::{EngineError, InvalidTransitionError};
use crate::locks::{master_lock, NamedLocks};
use crate::master_order_actor::{MasterOrderError, TransitionRecord};
use crate::model::{AccountId, MasterOrderId, MasterStatus, MemberOrderId, MemberStatus};
use crate::notify::{Notice, NotificationSink};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use store_actor::StoreClient;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionMode {
    Standard,
    System,
}

/// Published after every applied standard transition.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterStatusChanged {
    pub master: MasterOrderId,
    pub account: AccountId,
    pub from: MasterStatus,
    pub to: MasterStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberUpdate {
    pub member: MemberOrderId,
    pub from: MemberStatus,
    pub to: MemberStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionReport {
    pub master: MasterOrderId,
    pub from: MasterStatus,
    pub to: MasterStatus,
    pub propagated: Vec<MemberUpdate>,
    pub registry_retired: bool,
}

impl TransitionReport {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Result of a bulk transition. One rejected order does not stop the batch.
#[derive(Debug, Default)]
pub struct BulkTransitionReport {
    pub applied: Vec<TransitionReport>,
    pub rejected: Vec<(MasterOrderId, EngineError)>,
}

/// The member status a member in `current` moves to when its master order
/// enters `to`, if it moves at all.
pub fn propagation_target(
    policy: TerminalPropagation,
    current: MemberStatus,
    to: MasterStatus,
) -> Option<MemberStatus> {
    if let Some(mirror) = to.mirrored_member_status() {
        return current.is_behind(mirror).then_some(mirror);
    }
    if !to.is_terminal() {
        return None;
    }
    match (policy, current) {
        (TerminalPropagation::AdvanceToPrepared, MemberStatus::Warehouse) => {
            Some(MemberStatus::Prepared)
        }
        (TerminalPropagation::CompleteAll, MemberStatus::Warehouse | MemberStatus::Prepared) => {
            Some(MemberStatus::Completed)
        }
        _ => None,
    }
}

#[derive(Clone)]
pub struct StatusMachine {
    masters: MasterOrderClient,
    members: MemberOrderClient,
    registry: RegistryClient,
    locks: NamedLocks,
    notifier: Arc<dyn NotificationSink>,
    events: broadcast::Sender<MasterStatusChanged>,
    policy: TerminalPropagation,
    lock_timeout: Duration,
}

impl StatusMachine {
    pub fn new(
        masters: MasterOrderClient,
        members: MemberOrderClient,
        registry: RegistryClient,
        locks: NamedLocks,
        notifier: Arc<dyn NotificationSink>,
        events: broadcast::Sender<MasterStatusChanged>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            masters,
            members,
            registry,
            locks,
            notifier,
            events,
            policy: config.terminal_propagation,
            lock_timeout: config.allocation_lock_timeout,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MasterStatusChanged> {
        self.events.subscribe()
    }

    pub async fn transition(
        &self,
        master: MasterOrderId,
        to: MasterStatus,
    ) -> Result<TransitionReport, EngineError> {
        self.transition_with(master, to, TransitionMode::Standard)
            .await
    }

    /// Applies `to` to `master` and propagates it.
    ///
    /// Moving to the current status is accepted and changes nothing.
    #[instrument(skip(self))]
    pub async fn transition_with(
        &self,
        master: MasterOrderId,
        to: MasterStatus,
        mode: TransitionMode,
    ) -> Result<TransitionReport, EngineError> {
        let _guard = self
            .locks
            .acquire(master_lock(master), self.lock_timeout)
            .await?;

        let record = match self.masters.transition(master, to).await {
            Ok(record) => record,
            Err(MasterOrderError::InvalidTransition(rejected)) => {
                self.report_blocked(&rejected).await;
                return Err(rejected.into());
            }
            Err(MasterOrderError::NotFound(_)) => return Err(EngineError::MasterNotFound(master)),
            Err(e) => return Err(e.into()),
        };

        if !record.changed() {
            debug!(status = %to, "Already in requested status");
            return Ok(TransitionReport {
                master,
                from: record.from,
                to,
                propagated: Vec::new(),
                registry_retired: false,
            });
        }
        info!(%master, from = %record.from, to = %record.to, ?mode, "Master order status changed");

        let propagated = self.propagate(master, &record).await;
        let registry_retired = if to.is_terminal() {
            self.retire(master, record.account_id).await
        } else {
            false
        };

        self.notifier.record(Notice::info(
            master,
            format!(
                "Status changed from {} to {}; {} member order(s) updated",
                record.from,
                record.to,
                propagated.len()
            ),
        ));
        if mode == TransitionMode::Standard {
            // No subscribers is not an error.
            let _ = self.events.send(MasterStatusChanged {
                master,
                account: record.account_id,
                from: record.from,
                to: record.to,
                at: Utc::now(),
            });
        }

        Ok(TransitionReport {
            master,
            from: record.from,
            to: record.to,
            propagated,
            registry_retired,
        })
    }

    /// Applies `to` to each master order in turn.
    #[instrument(skip(self, masters), fields(count = masters.len()))]
    pub async fn transition_many(
        &self,
        masters: &[MasterOrderId],
        to: MasterStatus,
    ) -> BulkTransitionReport {
        let mut report = BulkTransitionReport::default();
        for &master in masters {
            match self.transition(master, to).await {
                Ok(applied) => report.applied.push(applied),
                Err(e) => report.rejected.push((master, e)),
            }
        }
        info!(
            applied = report.applied.len(),
            rejected = report.rejected.len(),
            "Bulk transition finished"
        );
        report
    }

    async fn report_blocked(&self, rejected: &InvalidTransitionError) {
        warn!(master = %rejected.master, from = %rejected.from, to = %rejected.to, "Blocked status change");
        let note = format!(
            "Blocked status change from {} to {}: not allowed",
            rejected.from, rejected.to
        );
        if let Err(e) = self.masters.add_note(rejected.master, note).await {
            warn!(master = %rejected.master, error = %e, "Could not note blocked status change");
        }
        self.notifier
            .record(Notice::warning(rejected.master, rejected.to_string()));
    }

    async fn propagate(&self, master: MasterOrderId, record: &TransitionRecord) -> Vec<MemberUpdate> {
        let mut updates = Vec::new();
        for &id in &record.members {
            let order = match self.members.fetch(id).await {
                Ok(Some(order)) => order,
                Ok(None) => {
                    warn!(member = %id, "Listed member order no longer exists");
                    continue;
                }
                Err(e) => {
                    warn!(member = %id, error = %e, "Could not load member order");
                    continue;
                }
            };
            if !order.is_linked_to(master) {
                warn!(member = %id, "Member order does not point back at its master order");
                continue;
            }
            let Some(target) = propagation_target(self.policy, order.status, record.to) else {
                continue;
            };
            let note = format!("Master order {master} moved to {}", record.to);
            match self.members.change_status(id, target, Some(note)).await {
                Ok(change) => updates.push(MemberUpdate {
                    member: id,
                    from: change.from,
                    to: change.to,
                }),
                Err(e) => warn!(member = %id, error = %e, "Could not propagate status"),
            }
        }
        updates
    }

    /// A failure here is logged only; allocation retires progressed master
    /// orders it finds in the registry anyway.
    async fn retire(&self, master: MasterOrderId, account: AccountId) -> bool {
        match self.registry.retire(account, master).await {
            Ok(retired) => retired,
            Err(e) => {
                warn!(%master, %account, error = %e, "Could not retire registry entry");
                false
            }
        }
    }
}
