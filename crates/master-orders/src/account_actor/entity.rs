//! [`Record`] implementation for [`Account`].

use super::AccountError;
use crate::model::{Account, AccountCreate, AccountId, AccountUpdate};
use async_trait::async_trait;
use store_actor::Record;

#[async_trait]
impl Record for Account {
    type Id = AccountId;
    type Create = AccountCreate;
    type Update = AccountUpdate;
    type Action = ();
    type ActionResult = ();
    type Context = ();
    type Error = AccountError;

    fn from_create_params(id: AccountId, params: AccountCreate) -> Result<Self, AccountError> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(AccountError::ValidationError(
                "account name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            pays_centrally: params.pays_centrally,
        })
    }

    async fn on_update(&mut self, update: AccountUpdate, _ctx: &()) -> Result<(), AccountError> {
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(AccountError::ValidationError(
                    "account name must not be empty".to_string(),
                ));
            }
            self.name = name.trim().to_string();
        }
        if let Some(pays_centrally) = update.pays_centrally {
            self.pays_centrally = pays_centrally;
        }
        Ok(())
    }

    async fn handle_action(&mut self, _action: (), _ctx: &()) -> Result<(), AccountError> {
        Ok(())
    }
}
