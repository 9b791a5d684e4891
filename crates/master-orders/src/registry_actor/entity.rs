//! [`Record`] implementation for [`RegistryEntry`].

use super::RegistryError;
use crate::model::{AccountId, MasterOrderId, RegistryEntry, Reservation, TxnId};
use async_trait::async_trait;
use chrono::Utc;
use store_actor::{Conflict, Record};

#[derive(Debug, Clone)]
pub enum RegistryAction {
    /// Attach the master order created under `txn` and release the reservation.
    Bind { txn: TxnId, master: MasterOrderId },
    /// Give up the reservation held by `txn`.
    Abort(TxnId),
    /// Deactivate the row if it still points at `master`.
    Retire(MasterOrderId),
}

#[async_trait]
impl Record for RegistryEntry {
    type Id = AccountId;
    type Create = Reservation;
    type Update = ();
    type Action = RegistryAction;
    /// `true` if the row changed.
    type ActionResult = bool;
    type Context = ();
    type Error = RegistryError;

    fn from_create_params(id: AccountId, params: Reservation) -> Result<Self, RegistryError> {
        Ok(Self::reserved(id, params.txn))
    }

    async fn on_update(&mut self, _update: (), _ctx: &()) -> Result<(), RegistryError> {
        Ok(())
    }

    async fn on_conflict(
        &mut self,
        params: Reservation,
        _ctx: &(),
    ) -> Result<Conflict, RegistryError> {
        if self.active {
            return Ok(Conflict::Untouched);
        }
        self.active = true;
        self.master_order = None;
        self.reservation = Some(params.txn);
        self.updated_at = Utc::now();
        Ok(Conflict::Updated)
    }

    async fn handle_action(
        &mut self,
        action: RegistryAction,
        _ctx: &(),
    ) -> Result<bool, RegistryError> {
        match action {
            RegistryAction::Bind { txn, master } => {
                if self.held_by() != Some(txn) {
                    return Err(RegistryError::ReservationLost {
                        account: self.account_id,
                        txn,
                    });
                }
                self.master_order = Some(master);
                self.reservation = None;
                self.updated_at = Utc::now();
                Ok(true)
            }
            RegistryAction::Abort(txn) => {
                if self.held_by() != Some(txn) {
                    return Ok(false);
                }
                self.active = false;
                self.reservation = None;
                self.master_order = None;
                self.updated_at = Utc::now();
                Ok(true)
            }
            RegistryAction::Retire(master) => {
                if self.active_master() != Some(master) {
                    return Ok(false);
                }
                self.active = false;
                self.updated_at = Utc::now();
                Ok(true)
            }
        }
    }
}
