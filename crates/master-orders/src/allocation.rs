//! # Allocation
//!
//! Finds the active master order of an account, or opens one, such that an
//! account never has two active master orders at once.
//!
//! Two locks guard the sequence:
//!
//! 1. A named per-account lock around the whole get-or-create, so concurrent
//!    admissions for one account queue up instead of racing.
//! 2. The registry row itself. An allocation reserves the row for its
//!    [`AllocationTxn`] with an atomic upsert before it creates anything, and
//!    any other reader that finds the row reserved waits for it to be bound or
//!    aborted. The upsert only claims a missing or inactive row, so even
//!    without the named lock at most one transaction can hold the account.
//!
//! A transaction either commits (the new master order is bound to the row)
//! or rolls back (the master order it created is deleted and the reservation
//! is released). A registry row never points at a half-created master order.
//! If the caller stops polling halfway, for example under a timeout, dropping
//! the transaction schedules the same rollback on the runtime.

use crate::account_actor::AccountError;
use crate::clients::{MasterOrderClient, RegistryClient};
use crate::config::EngineConfig;
use crate::error::AllocationError;
use crate::locks::{allocation_lock, NamedLocks};
use crate::model::{AccountId, BillingMetadata, MasterOrderCreate, MasterOrderId, TxnId};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use store_actor::{StoreClient, Upserted};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Source of an account's billing preference.
#[async_trait]
pub trait BillingPreferences: Send + Sync {
    /// `true` if the account settles its master order centrally.
    async fn central_billing(&self, account: AccountId) -> Result<bool, AccountError>;
}

#[derive(Clone)]
pub struct AllocationCoordinator {
    registry: RegistryClient,
    masters: MasterOrderClient,
    billing: Arc<dyn BillingPreferences>,
    locks: NamedLocks,
    lock_timeout: Duration,
    row_lock_poll: Duration,
    next_txn: Arc<AtomicU64>,
}

impl AllocationCoordinator {
    pub fn new(
        registry: RegistryClient,
        masters: MasterOrderClient,
        billing: Arc<dyn BillingPreferences>,
        locks: NamedLocks,
        config: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            masters,
            billing,
            locks,
            lock_timeout: config.allocation_lock_timeout,
            row_lock_poll: config.row_lock_poll,
            next_txn: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns the account's active master order, opening one if there is none.
    ///
    /// Fails with [`AllocationError::LockTimeout`] or
    /// [`AllocationError::RowLocked`] under contention (retryable), or with
    /// [`AllocationError::Storage`] after rolling back a failed creation.
    #[instrument(skip(self))]
    pub async fn acquire_or_create(
        &self,
        account: AccountId,
    ) -> Result<MasterOrderId, AllocationError> {
        let _guard = self
            .locks
            .acquire(allocation_lock(account), self.lock_timeout)
            .await
            .map_err(|e| AllocationError::LockTimeout {
                account,
                waited: e.waited,
            })?;
        let deadline = Instant::now() + self.lock_timeout;

        loop {
            let entry = self
                .registry
                .fetch(account)
                .await
                .map_err(|e| storage(account, e))?;

            if let Some(entry) = &entry {
                if let Some(holder) = entry.held_by() {
                    if Instant::now() >= deadline {
                        return Err(AllocationError::RowLocked { account, holder });
                    }
                    debug!(%holder, "Registry row held, waiting");
                    tokio::time::sleep(self.row_lock_poll).await;
                    continue;
                }
                if let Some(master) = entry.active_master() {
                    if self.is_open(account, master).await? {
                        debug!(%master, "Reusing active master order");
                        return Ok(master);
                    }
                }
            }

            let mut txn = AllocationTxn::begin(self, account);
            match self
                .registry
                .reserve(account, txn.id)
                .await
                .map_err(|e| storage(account, e))?
            {
                Upserted::Inserted(_) | Upserted::Updated(_) => return txn.complete().await,
                Upserted::Untouched(current) => {
                    txn.settle();
                    if Instant::now() >= deadline {
                        return Err(match current.held_by() {
                            Some(holder) => AllocationError::RowLocked { account, holder },
                            None => AllocationError::Storage {
                                account,
                                reason: "registry row could not be reserved".to_string(),
                            },
                        });
                    }
                    debug!(%txn.id, "Registry row taken concurrently, re-reading");
                }
            }
        }
    }

    /// Whether `master` can take new members. Otherwise retires it from the
    /// registry so a new one can be opened.
    async fn is_open(
        &self,
        account: AccountId,
        master: MasterOrderId,
    ) -> Result<bool, AllocationError> {
        let order = self
            .masters
            .fetch(master)
            .await
            .map_err(|e| storage(account, e))?;
        match order {
            Some(order) if order.status.is_initial() => return Ok(true),
            Some(order) => {
                info!(%master, status = %order.status, "Master order progressed, retiring it");
            }
            None => warn!(%master, "Registry points at a missing master order, retiring it"),
        }
        self.registry
            .retire(account, master)
            .await
            .map_err(|e| storage(account, e))?;
        Ok(false)
    }

    fn next_txn_id(&self) -> TxnId {
        TxnId(self.next_txn.fetch_add(1, Ordering::SeqCst))
    }
}

/// One attempt at opening a master order for an account, from the moment
/// its reservation is written.
pub struct AllocationTxn<'a> {
    coordinator: &'a AllocationCoordinator,
    account: AccountId,
    pub id: TxnId,
    created: Option<MasterOrderId>,
    /// Set once the transaction committed or rolled back.
    settled: bool,
}

impl<'a> AllocationTxn<'a> {
    fn begin(coordinator: &'a AllocationCoordinator, account: AccountId) -> Self {
        Self {
            coordinator,
            account,
            id: coordinator.next_txn_id(),
            created: None,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }

    /// Creates the master order and binds it to the reserved row.
    async fn complete(mut self) -> Result<MasterOrderId, AllocationError> {
        let account = self.account;
        let pays_centrally = match self.coordinator.billing.central_billing(account).await {
            Ok(central) => central,
            Err(e) => {
                warn!(%account, error = %e, "Billing preference unavailable, using central payment");
                true
            }
        };
        let params = MasterOrderCreate {
            account_id: account,
            billing: BillingMetadata::for_preference(pays_centrally),
        };

        let master = match self.coordinator.masters.open(params).await {
            Ok(master) => master,
            Err(e) => return Err(self.rollback(e.to_string()).await),
        };
        self.created = Some(master);

        if let Err(e) = self
            .coordinator
            .registry
            .bind(account, self.id, master)
            .await
        {
            return Err(self.rollback(e.to_string()).await);
        }

        self.settle();
        info!(%account, %master, txn = %self.id, pays_centrally, "Opened master order");
        Ok(master)
    }

    async fn rollback(mut self, reason: String) -> AllocationError {
        self.settle();
        let account = self.account;
        warn!(%account, txn = %self.id, %reason, "Rolling back allocation");
        if let Some(master) = self.created {
            if let Err(e) = self.coordinator.masters.remove(master).await {
                warn!(%master, error = %e, "Could not delete master order during rollback");
            }
        }
        if let Err(e) = self.coordinator.registry.abort(account, self.id).await {
            warn!(%account, error = %e, "Could not release reservation during rollback");
        }
        AllocationError::Storage { account, reason }
    }
}

impl Drop for AllocationTxn<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(account = %self.account, txn = %self.id, "No runtime to release an abandoned reservation");
            return;
        };
        let (account, txn, created) = (self.account, self.id, self.created);
        let registry = self.coordinator.registry.clone();
        let masters = self.coordinator.masters.clone();
        warn!(%account, %txn, "Allocation abandoned, releasing its reservation");
        runtime.spawn(async move {
            if let Some(master) = created {
                if let Err(e) = masters.remove(master).await {
                    warn!(%master, error = %e, "Could not delete abandoned master order");
                }
            }
            if let Err(e) = registry.abort(account, txn).await {
                warn!(%account, error = %e, "Could not release abandoned reservation");
            }
        });
    }
}

fn storage(account: AccountId, e: impl std::fmt::Display) -> AllocationError {
    AllocationError::Storage {
        account,
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MasterOrder, RegistryEntry};
    use crate::registry_actor::RegistryError;
    use store_actor::mock::MockClient;
    use store_actor::StoreError;

    struct Central;

    #[async_trait]
    impl BillingPreferences for Central {
        async fn central_billing(&self, _account: AccountId) -> Result<bool, AccountError> {
            Ok(true)
        }
    }

    fn coordinator(
        registry: &MockClient<RegistryEntry>,
        masters: &MockClient<MasterOrder>,
    ) -> AllocationCoordinator {
        AllocationCoordinator::new(
            RegistryClient::new(registry.client()),
            MasterOrderClient::new(masters.client()),
            Arc::new(Central),
            NamedLocks::new(),
            &EngineConfig::default().with_allocation_lock_timeout(Duration::from_millis(200)),
        )
    }

    #[tokio::test]
    async fn failed_creation_releases_the_reservation() {
        let mut registry = MockClient::<RegistryEntry>::new();
        let mut masters = MockClient::<MasterOrder>::new();
        registry.expect_get().return_ok(None);
        registry
            .expect_upsert()
            .return_ok(Upserted::Inserted(RegistryEntry::reserved(AccountId(1), TxnId(1))));
        masters.expect_create().return_err(StoreError::ActorClosed);
        registry.expect_action().return_ok(true);

        let err = coordinator(&registry, &masters)
            .acquire_or_create(AccountId(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::Storage { .. }));
        assert!(!err.is_retryable());
        registry.verify();
        masters.verify();
    }

    #[tokio::test]
    async fn lost_reservation_deletes_the_new_master_order() {
        let mut registry = MockClient::<RegistryEntry>::new();
        let mut masters = MockClient::<MasterOrder>::new();
        registry.expect_get().return_ok(None);
        registry
            .expect_upsert()
            .return_ok(Upserted::Inserted(RegistryEntry::reserved(AccountId(1), TxnId(1))));
        masters.expect_create().return_ok(MasterOrderId(4));
        registry
            .expect_action()
            .return_err(StoreError::Rejected(Box::new(RegistryError::ReservationLost {
                account: AccountId(1),
                txn: TxnId(1),
            })));
        masters.expect_delete().return_ok(());
        registry.expect_action().return_ok(false);

        let err = coordinator(&registry, &masters)
            .acquire_or_create(AccountId(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::Storage { account, .. } if account == AccountId(1)));
        registry.verify();
        masters.verify();
    }

    #[tokio::test]
    async fn a_row_held_past_the_deadline_is_reported_as_locked() {
        let mut registry = MockClient::<RegistryEntry>::new();
        let masters = MockClient::<MasterOrder>::new();
        let held = RegistryEntry::reserved(AccountId(1), TxnId(77));
        for _ in 0..64 {
            registry.expect_get().return_ok(Some(held.clone()));
        }
        let coordinator = AllocationCoordinator::new(
            RegistryClient::new(registry.client()),
            MasterOrderClient::new(masters.client()),
            Arc::new(Central),
            NamedLocks::new(),
            &EngineConfig::default()
                .with_allocation_lock_timeout(Duration::from_millis(50))
                .with_row_lock_poll(Duration::from_millis(10)),
        );

        let err = coordinator.acquire_or_create(AccountId(1)).await.unwrap_err();

        assert_eq!(
            err,
            AllocationError::RowLocked {
                account: AccountId(1),
                holder: TxnId(77)
            }
        );
        assert!(err.is_retryable());
    }

    struct SlowCentral(Duration);

    #[async_trait]
    impl BillingPreferences for SlowCentral {
        async fn central_billing(&self, _account: AccountId) -> Result<bool, AccountError> {
            tokio::time::sleep(self.0).await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn an_abandoned_allocation_frees_the_account() {
        let (registry_actor, registry) = crate::registry_actor::new(8);
        let (master_actor, masters) = crate::master_order_actor::new(8);
        tokio::spawn(registry_actor.run(()));
        tokio::spawn(master_actor.run(()));
        let coordinator = AllocationCoordinator::new(
            registry.clone(),
            masters.clone(),
            Arc::new(SlowCentral(Duration::from_millis(200))),
            NamedLocks::new(),
            &EngineConfig::default()
                .with_allocation_lock_timeout(Duration::from_secs(5))
                .with_row_lock_poll(Duration::from_millis(5)),
        );

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            coordinator.acquire_or_create(AccountId(42)),
        )
        .await;
        assert!(cancelled.is_err());

        let master = coordinator
            .acquire_or_create(AccountId(42))
            .await
            .expect("account stayed locked after a cancelled allocation");

        let entry = registry.fetch(AccountId(42)).await.unwrap().unwrap();
        assert_eq!(entry.active_master(), Some(master));
        let opened = masters.list(|_| true).await.unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].id, master);
    }
}
