//! [`Record`] implementation for [`MemberOrder`].

use super::actions::{Link, MemberOrderAction, MemberOrderActionResult, StatusChange};
use super::MemberOrderError;
use crate::model::{MemberOrder, MemberOrderCreate, MemberOrderId, OrderNote};
use async_trait::async_trait;
use chrono::Utc;
use store_actor::Record;

#[async_trait]
impl Record for MemberOrder {
    type Id = MemberOrderId;
    type Create = MemberOrderCreate;
    type Update = ();
    type Action = MemberOrderAction;
    type ActionResult = MemberOrderActionResult;
    type Context = ();
    type Error = MemberOrderError;

    fn from_create_params(
        id: MemberOrderId,
        params: MemberOrderCreate,
    ) -> Result<Self, MemberOrderError> {
        Ok(Self::new(id, params.account_id, params.items, params.status))
    }

    async fn on_update(&mut self, _update: (), _ctx: &()) -> Result<(), MemberOrderError> {
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: MemberOrderAction,
        _ctx: &(),
    ) -> Result<MemberOrderActionResult, MemberOrderError> {
        match action {
            MemberOrderAction::LinkMaster(master) => {
                let link = match self.master_order {
                    Some(current) if current == master => Link::AlreadyLinked,
                    Some(other) => Link::LinkedElsewhere(other),
                    None => {
                        self.master_order = Some(master);
                        self.merged_at = Some(Utc::now());
                        Link::Linked
                    }
                };
                Ok(MemberOrderActionResult::LinkMaster(link))
            }
            MemberOrderAction::UnlinkMaster(expected) => {
                let cleared = self.master_order == Some(expected);
                if cleared {
                    self.master_order = None;
                    self.merged_at = None;
                }
                Ok(MemberOrderActionResult::UnlinkMaster(cleared))
            }
            MemberOrderAction::ChangeStatus { status, note } => {
                let change = StatusChange {
                    from: self.status,
                    to: status,
                };
                self.status = status;
                if let Some(message) = note {
                    self.notes.push(OrderNote::now(message));
                }
                Ok(MemberOrderActionResult::ChangeStatus(change))
            }
            MemberOrderAction::AddNote(message) => {
                self.notes.push(OrderNote::now(message));
                Ok(MemberOrderActionResult::AddNote(()))
            }
        }
    }
}
