//! # Membership
//!
//! Admits member orders into their account's master order and takes them out
//! again while the master order is still being assembled.
//!
//! Lock order, always taken in this sequence and never the other way round:
//! `remove:{member}` (removal only, try-lock), `member:{member}`,
//! `alloc:{account}` (inside allocation, released before the next step),
//! `master:{master}`. Status transitions take only `master:{master}`.

use crate::allocation::AllocationCoordinator;
use crate::builder::{Builder, MergeOutcome, ReconstructionReport, SkipReason};
use crate::clients::{MasterOrderClient, MemberOrderClient, RegistryClient};
use crate::config::EngineConfig;
use crate::error::{EngineError, RemovalRefusedError};
use crate::locks::{master_lock, member_lock, removal_lock, NamedLockGuard, NamedLocks};
use crate::model::{MasterOrder, MasterOrderId, MemberOrder, MemberOrderId, MemberStatus, OrderTotals};
use crate::notify::{Notice, NotificationSink};
use std::sync::Arc;
use std::time::Duration;
use store_actor::StoreClient;
use tracing::{debug, info, instrument, warn};

/// How often admission retries when its master order was sealed or deleted
/// between allocation and merge.
const ADMIT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum AdmitOutcome {
    Admitted {
        master: MasterOrderId,
        totals: OrderTotals,
    },
    /// The member already belongs to this master order.
    AlreadyMember { master: MasterOrderId },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// The member left; `report` is `None` when the master order was deleted
    /// because it had no members left.
    Removed {
        master: MasterOrderId,
        report: Option<ReconstructionReport>,
    },
    Refused(RemovalRefusedError),
    /// The member is in no master order.
    NotLinked,
    /// Another removal of the same member is running.
    InProgress,
}

/// What a member status change led to.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipChange {
    Admit(AdmitOutcome),
    Remove(RemovalOutcome),
    Unaffected,
}

#[derive(Clone)]
pub struct MembershipManager {
    members: MemberOrderClient,
    masters: MasterOrderClient,
    registry: RegistryClient,
    allocator: AllocationCoordinator,
    builder: Builder,
    locks: NamedLocks,
    notifier: Arc<dyn NotificationSink>,
    lock_timeout: Duration,
    removal_wait: Duration,
}

impl MembershipManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        members: MemberOrderClient,
        masters: MasterOrderClient,
        registry: RegistryClient,
        allocator: AllocationCoordinator,
        builder: Builder,
        locks: NamedLocks,
        notifier: Arc<dyn NotificationSink>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            members,
            masters,
            registry,
            allocator,
            builder,
            locks,
            notifier,
            lock_timeout: config.allocation_lock_timeout,
            removal_wait: config.removal_lock_wait,
        }
    }

    /// Merges a member order into its account's active master order.
    ///
    /// Safe to call repeatedly for the same member: a member that is already
    /// in a master order is reported as such and nothing changes.
    #[instrument(skip(self))]
    pub async fn admit(&self, member: MemberOrderId) -> Result<AdmitOutcome, EngineError> {
        let _member_guard = self
            .locks
            .acquire(member_lock(member), self.lock_timeout)
            .await?;
        let order = self.load_member(member).await?;

        if !order.status.is_admissible() {
            debug!(status = %order.status, "Not admissible");
            return Ok(AdmitOutcome::Skipped(SkipReason::NotAdmissible(order.status)));
        }
        let Some(account) = order.account_id else {
            debug!("Member order has no account");
            return Ok(AdmitOutcome::Skipped(SkipReason::NoAccount));
        };
        if let Some(current) = order.master_order {
            if self.lists(current, member).await? {
                return Ok(AdmitOutcome::AlreadyMember { master: current });
            }
            warn!(master = %current, "Clearing stale back-reference");
            self.members.unlink_master(member, current).await?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let master = self.allocator.acquire_or_create(account).await?;
            let _master_guard = self
                .locks
                .acquire(master_lock(master), self.lock_timeout)
                .await?;

            match self.builder.merge_into(master, &order).await {
                Ok(MergeOutcome::Merged(totals)) => {
                    info!(%master, %account, items = totals.item_count, "Admitted member order");
                    self.notifier.record(Notice::info(
                        master,
                        format!(
                            "{member} merged: {} item(s) on {} line(s), total {}",
                            totals.item_count, totals.line_item_count, totals.total
                        ),
                    ));
                    return Ok(AdmitOutcome::Admitted { master, totals });
                }
                Ok(MergeOutcome::AlreadyMerged) => {
                    return Ok(AdmitOutcome::AlreadyMember { master })
                }
                Ok(MergeOutcome::Skipped(reason)) => return Ok(AdmitOutcome::Skipped(reason)),
                Err(EngineError::MasterOrder(e)) if e.is_stale_target() && attempt < ADMIT_ATTEMPTS => {
                    debug!(%master, error = %e, "Master order closed before merge, allocating again");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Takes a member order out of its master order.
    ///
    /// Refused once the master order has left `validated`; the refusal is
    /// noted on both orders. Removing the last member deletes the master order
    /// and frees the account for a new one.
    #[instrument(skip(self))]
    pub async fn remove(&self, member: MemberOrderId) -> Result<RemovalOutcome, EngineError> {
        let Some(_removal_guard) = self.removal_guard(member).await else {
            debug!("Removal already in progress");
            return Ok(RemovalOutcome::InProgress);
        };
        let _member_guard = self
            .locks
            .acquire(member_lock(member), self.lock_timeout)
            .await?;
        let order = self.load_member(member).await?;

        let Some(master_id) = self.locate_master(&order).await? else {
            return Ok(RemovalOutcome::NotLinked);
        };
        let _master_guard = self
            .locks
            .acquire(master_lock(master_id), self.lock_timeout)
            .await?;

        let Some(master) = self.masters.fetch(master_id).await? else {
            warn!(master = %master_id, "Back-reference points at a missing master order");
            self.members.unlink_master(member, master_id).await?;
            return Ok(RemovalOutcome::NotLinked);
        };
        if !master.has_member(member) {
            warn!(master = %master_id, "Member order not listed by its master order");
            self.members.unlink_master(member, master_id).await?;
            return Ok(RemovalOutcome::NotLinked);
        }
        if !master.status.is_initial() {
            return Ok(RemovalOutcome::Refused(self.refuse(member, &master).await));
        }

        let remaining = self.masters.drop_member(master_id, member).await?;
        self.members.unlink_master(member, master_id).await?;

        if remaining.is_empty() {
            self.masters.remove(master_id).await?;
            self.registry.retire(master.account_id, master_id).await?;
            info!(master = %master_id, account = %master.account_id, "Deleted empty master order");
            self.notifier.record(Notice::info(
                master_id,
                format!("{member} removed; master order had no members left and was deleted"),
            ));
            return Ok(RemovalOutcome::Removed {
                master: master_id,
                report: None,
            });
        }

        let report = self.builder.reconstruct(master_id, &remaining).await?;
        self.notifier.record(Notice::info(
            master_id,
            format!(
                "{member} removed; now {} item(s) on {} line(s), total {}",
                report.item_count(),
                report.line_item_count(),
                report.totals.total
            ),
        ));
        Ok(RemovalOutcome::Removed {
            master: master_id,
            report: Some(report),
        })
    }

    /// Routes a member status change: entering an admissible status admits,
    /// leaving one removes. Becoming void also asks for removal, so a member
    /// cancelled after its master order moved on is refused and noted.
    #[instrument(skip(self))]
    pub async fn on_member_status_changed(
        &self,
        member: MemberOrderId,
        old: MemberStatus,
        new: MemberStatus,
    ) -> Result<MembershipChange, EngineError> {
        let leaves = old.is_admissible() && !new.is_admissible();
        let voided = new.is_void() && !old.is_void();
        if new.is_admissible() && !old.is_admissible() {
            Ok(MembershipChange::Admit(self.admit(member).await?))
        } else if leaves || voided {
            Ok(MembershipChange::Remove(self.remove(member).await?))
        } else {
            Ok(MembershipChange::Unaffected)
        }
    }

    async fn removal_guard(&self, member: MemberOrderId) -> Option<NamedLockGuard> {
        if self.removal_wait.is_zero() {
            self.locks.try_acquire(removal_lock(member))
        } else {
            self.locks
                .acquire(removal_lock(member), self.removal_wait)
                .await
                .ok()
        }
    }

    async fn load_member(&self, member: MemberOrderId) -> Result<MemberOrder, EngineError> {
        self.members
            .fetch(member)
            .await?
            .ok_or(EngineError::MemberNotFound(member))
    }

    async fn lists(&self, master: MasterOrderId, member: MemberOrderId) -> Result<bool, EngineError> {
        Ok(self
            .masters
            .fetch(master)
            .await?
            .is_some_and(|m| m.has_member(member)))
    }

    /// The master order of `order`: its back-reference, or, if that is
    /// missing, a master order that still lists it.
    async fn locate_master(&self, order: &MemberOrder) -> Result<Option<MasterOrderId>, EngineError> {
        if let Some(master) = order.master_order {
            return Ok(Some(master));
        }
        let id = order.id;
        let listing = self.masters.list(move |m| m.has_member(id)).await?;
        if let Some(master) = listing.first() {
            warn!(master = %master.id, "Member order lost its back-reference, repairing");
            self.members.link_master(id, master.id).await?;
            return Ok(Some(master.id));
        }
        Ok(None)
    }

    async fn refuse(&self, member: MemberOrderId, master: &MasterOrder) -> RemovalRefusedError {
        let refused = RemovalRefusedError {
            member,
            master: master.id,
            status: master.status,
        };
        warn!(master = %master.id, status = %master.status, "Removal refused");
        let note = format!(
            "Not removed from master order {}: it is already {}",
            master.id, master.status
        );
        if let Err(e) = self.members.add_note(member, note).await {
            warn!(error = %e, "Could not note refused removal on the member order");
        }
        if let Err(e) = self.masters.add_note(master.id, refused.to_string()).await {
            warn!(error = %e, "Could not note refused removal on the master order");
        }
        self.notifier
            .record(Notice::warning(master.id, refused.to_string()));
        refused
    }
}
