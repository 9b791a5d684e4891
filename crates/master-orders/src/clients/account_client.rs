//! # Account Client
//!
//! Provides a high‑level API for interacting with the `Account` actor.
use crate::account_actor::AccountError;
use crate::allocation::BillingPreferences;
use crate::model::{Account, AccountCreate, AccountId, AccountUpdate};
use async_trait::async_trait;
use store_actor::{RecordClient, StoreClient, StoreError};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct AccountClient {
    inner: RecordClient<Account>,
}

impl AccountClient {
    pub fn new(inner: RecordClient<Account>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StoreClient<Account> for AccountClient {
    type Error = AccountError;

    fn inner(&self) -> &RecordClient<Account> {
        &self.inner
    }

    fn map_error(e: StoreError) -> Self::Error {
        e.into()
    }
}

impl AccountClient {
    #[instrument(skip(self))]
    pub async fn create_account(&self, params: AccountCreate) -> Result<AccountId, AccountError> {
        debug!("Sending request");
        Ok(self.inner.create(params).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_account(
        &self,
        id: AccountId,
        update: AccountUpdate,
    ) -> Result<Account, AccountError> {
        debug!("Sending request");
        Ok(self.inner.update(id, update).await?)
    }

    /// The account's billing preference. Unknown accounts pay centrally.
    #[instrument(skip(self))]
    pub async fn pays_centrally(&self, id: AccountId) -> Result<bool, AccountError> {
        let account = self.fetch(id).await?;
        Ok(account.map_or(true, |a| a.pays_centrally))
    }
}

#[async_trait]
impl BillingPreferences for AccountClient {
    async fn central_billing(&self, account: AccountId) -> Result<bool, AccountError> {
        self.pays_centrally(account).await
    }
}
