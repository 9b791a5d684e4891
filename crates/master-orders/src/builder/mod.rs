//! # Builder
//!
//! Keeps a master order's lines equal to the sum of its members' lines.
//!
//! - [`Builder::merge_into`] adds one member incrementally.
//! - [`Builder::reconstruct`] throws the lines away and folds the remaining
//!   members again from scratch, so the result never depends on earlier state.
//!
//! The line arithmetic lives in [`consolidate`] and is shared by both paths.
//! Both persist through a single master order action, which the master order
//! actor applies atomically.

pub mod consolidate;

pub use consolidate::{consolidate, merge_items, sort_items, Consolidation};

use crate::clients::{MasterOrderClient, MemberOrderClient};
use crate::error::{EngineError, ReconstructionError};
use crate::master_order_actor::{MasterOrderError, Merged};
use crate::member_order_actor::Link;
use crate::model::{
    LineItem, MasterOrderId, MemberOrder, MemberOrderId, MemberStatus, OrderTotals, ProductKey,
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use store_actor::StoreClient;
use tracing::{debug, info, instrument, warn};

/// Totals of a set of lines.
pub fn compute_totals(items: &[LineItem]) -> OrderTotals {
    OrderTotals::of(items)
}

/// Tells whether a product still exists.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn resolves(&self, key: ProductKey) -> bool;
}

/// A catalog in which every product resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCatalog;

#[async_trait]
impl ProductCatalog for OpenCatalog {
    async fn resolves(&self, _key: ProductKey) -> bool {
        true
    }
}

/// A catalog that knows which products were withdrawn.
#[derive(Debug, Clone, Default)]
pub struct WithdrawnProducts {
    withdrawn: HashSet<ProductKey>,
}

impl WithdrawnProducts {
    pub fn new(withdrawn: impl IntoIterator<Item = ProductKey>) -> Self {
        Self {
            withdrawn: withdrawn.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ProductCatalog for WithdrawnProducts {
    async fn resolves(&self, key: ProductKey) -> bool {
        !self.withdrawn.contains(&key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Merged(OrderTotals),
    /// The member was already in the master order; nothing changed.
    AlreadyMerged,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAdmissible(MemberStatus),
    NoAccount,
    /// The member is in another master order.
    LinkedElsewhere(MasterOrderId),
}

/// What a rebuild produced and what it had to leave out.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionReport {
    pub master: MasterOrderId,
    pub totals: OrderTotals,
    pub skipped: Vec<ReconstructionError>,
}

impl ReconstructionReport {
    pub fn item_count(&self) -> u32 {
        self.totals.item_count
    }

    pub fn line_item_count(&self) -> usize {
        self.totals.line_item_count
    }

    pub fn skipped_items(&self) -> usize {
        self.skipped
            .iter()
            .filter(|e| matches!(e, ReconstructionError::UnresolvableProduct { .. }))
            .count()
    }
}

#[derive(Clone)]
pub struct Builder {
    members: MemberOrderClient,
    masters: MasterOrderClient,
    catalog: Arc<dyn ProductCatalog>,
}

impl Builder {
    pub fn new(
        members: MemberOrderClient,
        masters: MasterOrderClient,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            members,
            masters,
            catalog,
        }
    }

    /// Merges `member` into `master`.
    ///
    /// The member's back-reference is written first. If the merge itself then
    /// fails, a reference written by this call is cleared again, so a member
    /// never points at a master order that does not list it.
    #[instrument(skip(self, member), fields(member = %member.id))]
    pub async fn merge_into(
        &self,
        master: MasterOrderId,
        member: &MemberOrder,
    ) -> Result<MergeOutcome, EngineError> {
        if !member.status.is_admissible() {
            return Ok(MergeOutcome::Skipped(SkipReason::NotAdmissible(
                member.status,
            )));
        }

        let link = self.members.link_master(member.id, master).await?;
        if let Link::LinkedElsewhere(other) = link {
            debug!(%other, "Member already belongs to another master order");
            return Ok(MergeOutcome::Skipped(SkipReason::LinkedElsewhere(other)));
        }

        match self
            .masters
            .merge_member(master, member.id, member.items.clone())
            .await
        {
            Ok(Merged::Added(totals)) => {
                debug!(items = totals.item_count, "Merged");
                Ok(MergeOutcome::Merged(totals))
            }
            Ok(Merged::AlreadyPresent) => Ok(MergeOutcome::AlreadyMerged),
            Err(e) => {
                if link == Link::Linked {
                    self.unlink_after_failure(member.id, master).await;
                }
                Err(e.into())
            }
        }
    }

    async fn unlink_after_failure(&self, member: MemberOrderId, master: MasterOrderId) {
        if let Err(e) = self.members.unlink_master(member, master).await {
            warn!(%member, %master, error = %e, "Could not clear back-reference after failed merge");
        }
    }

    /// Rebuilds `master`'s lines from `remaining`, in that order.
    ///
    /// Missing members and lines of withdrawn products are skipped and listed
    /// in the report. The write is refused if the membership list no longer
    /// equals `remaining`.
    #[instrument(skip(self, remaining), fields(members = remaining.len()))]
    pub async fn reconstruct(
        &self,
        master: MasterOrderId,
        remaining: &[MemberOrderId],
    ) -> Result<ReconstructionReport, EngineError> {
        let mut loaded = Vec::with_capacity(remaining.len());
        let mut skipped = Vec::new();
        for id in remaining {
            match self.members.fetch(*id).await? {
                Some(order) => loaded.push(order),
                None => {
                    warn!(member = %id, "Member order vanished, leaving it out of the rebuild");
                    skipped.push(ReconstructionError::MissingMember(*id));
                }
            }
        }

        let keys: BTreeSet<ProductKey> = loaded
            .iter()
            .filter(|m| !m.status.is_void())
            .flat_map(|m| m.items.iter().map(LineItem::key))
            .collect();
        let mut resolvable = HashSet::with_capacity(keys.len());
        for key in keys {
            if self.catalog.resolves(key).await {
                resolvable.insert(key);
            }
        }

        let consolidation = consolidate(&loaded, |item| resolvable.contains(&item.key()));
        for issue in &consolidation.skipped {
            warn!(%master, %issue, "Skipped during rebuild");
        }
        skipped.extend(consolidation.skipped);

        let totals = self
            .masters
            .rebuild(master, remaining.to_vec(), consolidation.items)
            .await
            .map_err(|e| match e {
                MasterOrderError::NotFound(_) => EngineError::MasterNotFound(master),
                other => other.into(),
            })?;

        info!(
            %master,
            item_count = totals.item_count,
            line_item_count = totals.line_item_count,
            skipped = skipped.len(),
            "Rebuilt master order"
        );
        Ok(ReconstructionReport {
            master,
            totals,
            skipped,
        })
    }
}
