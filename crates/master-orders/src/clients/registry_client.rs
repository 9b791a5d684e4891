//! # Registry Client
//!
//! Provides a high‑level API for interacting with the `Registry` actor.
use crate::model::{AccountId, MasterOrderId, RegistryEntry, Reservation, TxnId};
use crate::registry_actor::{RegistryAction, RegistryError};
use async_trait::async_trait;
use store_actor::{RecordClient, StoreClient, StoreError, Upserted};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct RegistryClient {
    inner: RecordClient<RegistryEntry>,
}

impl RegistryClient {
    pub fn new(inner: RecordClient<RegistryEntry>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StoreClient<RegistryEntry> for RegistryClient {
    type Error = RegistryError;

    fn inner(&self) -> &RecordClient<RegistryEntry> {
        &self.inner
    }

    fn map_error(e: StoreError) -> Self::Error {
        e.into()
    }
}

impl RegistryClient {
    /// Claims the account's row for `txn`. The row is only claimed if it was
    /// missing or inactive; otherwise the current row comes back untouched.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        account: AccountId,
        txn: TxnId,
    ) -> Result<Upserted<RegistryEntry>, RegistryError> {
        debug!("Sending request");
        Ok(self.inner.upsert(account, Reservation { txn }).await?)
    }

    #[instrument(skip(self))]
    pub async fn bind(
        &self,
        account: AccountId,
        txn: TxnId,
        master: MasterOrderId,
    ) -> Result<(), RegistryError> {
        debug!("Sending request");
        self.inner
            .perform_action(account, RegistryAction::Bind { txn, master })
            .await?;
        Ok(())
    }

    /// Releases `txn`'s reservation. `false` if it no longer held the row.
    #[instrument(skip(self))]
    pub async fn abort(&self, account: AccountId, txn: TxnId) -> Result<bool, RegistryError> {
        debug!("Sending request");
        Ok(self
            .inner
            .perform_action(account, RegistryAction::Abort(txn))
            .await?)
    }

    /// Deactivates the row if `master` is still the active master order.
    #[instrument(skip(self))]
    pub async fn retire(
        &self,
        account: AccountId,
        master: MasterOrderId,
    ) -> Result<bool, RegistryError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(account, RegistryAction::Retire(master))
            .await
        {
            Ok(retired) => Ok(retired),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
