//! [`Record`] implementation for [`MasterOrder`].

use super::actions::{MasterOrderAction, MasterOrderActionResult, Merged, TransitionRecord};
use super::MasterOrderError;
use crate::builder::merge_items;
use crate::error::InvalidTransitionError;
use crate::model::{
    MasterOrder, MasterOrderCreate, MasterOrderId, OrderNote, OrderTotals, PaymentMode,
    PaymentState,
};
use async_trait::async_trait;
use chrono::Utc;
use store_actor::Record;

impl MasterOrder {
    fn ensure_accepting(&self) -> Result<(), MasterOrderError> {
        if self.status.is_initial() {
            Ok(())
        } else {
            Err(MasterOrderError::NotAccepting {
                master: self.id,
                status: self.status,
            })
        }
    }

    fn touch(&mut self) {
        self.totals = OrderTotals::of(&self.items);
        self.updated_at = Utc::now();
    }
}

#[async_trait]
impl Record for MasterOrder {
    type Id = MasterOrderId;
    type Create = MasterOrderCreate;
    type Update = ();
    type Action = MasterOrderAction;
    type ActionResult = MasterOrderActionResult;
    type Context = ();
    type Error = MasterOrderError;

    fn from_create_params(
        id: MasterOrderId,
        params: MasterOrderCreate,
    ) -> Result<Self, MasterOrderError> {
        Ok(Self::new(id, params.account_id, params.billing))
    }

    async fn on_update(&mut self, _update: (), _ctx: &()) -> Result<(), MasterOrderError> {
        Ok(())
    }

    /// A master order is only deleted once its last member left.
    async fn on_delete(&self, _ctx: &()) -> Result<(), MasterOrderError> {
        if self.members.is_empty() {
            Ok(())
        } else {
            Err(MasterOrderError::StillInUse {
                master: self.id,
                members: self.members.len(),
            })
        }
    }

    async fn handle_action(
        &mut self,
        action: MasterOrderAction,
        _ctx: &(),
    ) -> Result<MasterOrderActionResult, MasterOrderError> {
        match action {
            MasterOrderAction::Merge { member, items } => {
                self.ensure_accepting()?;
                if self.has_member(member) {
                    return Ok(MasterOrderActionResult::Merge(Merged::AlreadyPresent));
                }
                merge_items(&mut self.items, &items);
                self.members.push(member);
                self.touch();
                Ok(MasterOrderActionResult::Merge(Merged::Added(
                    self.totals.clone(),
                )))
            }
            MasterOrderAction::Rebuild { members, items } => {
                self.ensure_accepting()?;
                if members != self.members {
                    return Err(MasterOrderError::MembershipChanged { master: self.id });
                }
                self.items = items;
                self.touch();
                Ok(MasterOrderActionResult::Rebuild(self.totals.clone()))
            }
            MasterOrderAction::DropMember(member) => {
                self.ensure_accepting()?;
                if !self.has_member(member) {
                    return Err(MasterOrderError::NotAMember {
                        master: self.id,
                        member,
                    });
                }
                self.members.retain(|m| *m != member);
                self.updated_at = Utc::now();
                Ok(MasterOrderActionResult::DropMember(self.members.clone()))
            }
            MasterOrderAction::Transition(to) => {
                let from = self.status;
                if from.is_regression(to) {
                    return Err(InvalidTransitionError {
                        master: self.id,
                        from,
                        to,
                    }
                    .into());
                }
                if from != to {
                    self.status = to;
                    self.updated_at = Utc::now();
                }
                Ok(MasterOrderActionResult::Transition(TransitionRecord {
                    account_id: self.account_id,
                    from,
                    to,
                    members: self.members.clone(),
                }))
            }
            MasterOrderAction::AddNote(message) => {
                self.notes.push(OrderNote::now(message));
                Ok(MasterOrderActionResult::AddNote(()))
            }
            MasterOrderAction::ConfirmPayment => {
                let settled = self.billing.mode == PaymentMode::Central
                    && self.billing.state == PaymentState::Unpaid;
                if settled {
                    self.billing.state = PaymentState::Paid;
                    self.billing.paid_at = Some(Utc::now());
                    self.updated_at = Utc::now();
                }
                Ok(MasterOrderActionResult::ConfirmPayment(settled))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountId, BillingMetadata, LineItem, MasterStatus, MemberOrderId, ProductId};
    use rust_decimal::Decimal;

    fn master() -> MasterOrder {
        MasterOrder::new(
            MasterOrderId(1),
            AccountId(1),
            BillingMetadata::for_preference(true),
        )
    }

    fn merge(member: u64, product: u64, quantity: u32) -> MasterOrderAction {
        MasterOrderAction::Merge {
            member: MemberOrderId(member),
            items: vec![LineItem::new(ProductId(product), "item", quantity, Decimal::ONE)],
        }
    }

    #[tokio::test]
    async fn merging_the_same_member_twice_is_a_no_op() {
        let mut order = master();
        order.handle_action(merge(1, 7, 2), &()).await.unwrap();
        let again = order.handle_action(merge(1, 7, 2), &()).await.unwrap();

        assert_eq!(again, MasterOrderActionResult::Merge(Merged::AlreadyPresent));
        assert_eq!(order.members, vec![MemberOrderId(1)]);
        assert_eq!(order.totals.item_count, 2);
    }

    #[tokio::test]
    async fn progressed_orders_refuse_membership_changes() {
        let mut order = master();
        order.handle_action(merge(1, 7, 2), &()).await.unwrap();
        order
            .handle_action(MasterOrderAction::Transition(MasterStatus::Warehouse), &())
            .await
            .unwrap();

        let err = order.handle_action(merge(2, 7, 1), &()).await.unwrap_err();
        assert!(matches!(err, MasterOrderError::NotAccepting { .. }));
        let err = order
            .handle_action(MasterOrderAction::DropMember(MemberOrderId(1)), &())
            .await
            .unwrap_err();
        assert!(err.is_stale_target());
    }

    #[tokio::test]
    async fn regression_is_rejected_without_touching_the_status() {
        let mut order = master();
        order.status = MasterStatus::Prepared;

        let err = order
            .handle_action(MasterOrderAction::Transition(MasterStatus::Validated), &())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            MasterOrderError::InvalidTransition(InvalidTransitionError {
                master: MasterOrderId(1),
                from: MasterStatus::Prepared,
                to: MasterStatus::Validated,
            })
        );
        assert_eq!(order.status, MasterStatus::Prepared);
    }

    #[tokio::test]
    async fn complete_rejects_even_complete() {
        let mut order = master();
        order.status = MasterStatus::Complete;

        let err = order
            .handle_action(MasterOrderAction::Transition(MasterStatus::Complete), &())
            .await
            .unwrap_err();

        assert!(matches!(err, MasterOrderError::InvalidTransition(_)));
        assert_eq!(order.status, MasterStatus::Complete);
    }

    #[tokio::test]
    async fn rebuild_from_a_stale_membership_is_refused() {
        let mut order = master();
        order.handle_action(merge(1, 7, 2), &()).await.unwrap();
        order.handle_action(merge(2, 8, 1), &()).await.unwrap();

        let err = order
            .handle_action(
                MasterOrderAction::Rebuild {
                    members: vec![MemberOrderId(1)],
                    items: Vec::new(),
                },
                &(),
            )
            .await
            .unwrap_err();

        assert_eq!(err, MasterOrderError::MembershipChanged { master: MasterOrderId(1) });
        assert_eq!(order.items.len(), 2);
    }

    #[tokio::test]
    async fn delete_is_vetoed_while_members_remain() {
        let mut order = master();
        order.handle_action(merge(1, 7, 2), &()).await.unwrap();
        assert!(order.on_delete(&()).await.is_err());

        order
            .handle_action(MasterOrderAction::DropMember(MemberOrderId(1)), &())
            .await
            .unwrap();
        assert!(order.on_delete(&()).await.is_ok());
    }

    #[tokio::test]
    async fn central_payment_is_confirmed_once() {
        let mut order = master();
        let first = order
            .handle_action(MasterOrderAction::ConfirmPayment, &())
            .await
            .unwrap();
        let second = order
            .handle_action(MasterOrderAction::ConfirmPayment, &())
            .await
            .unwrap();

        assert_eq!(first, MasterOrderActionResult::ConfirmPayment(true));
        assert_eq!(second, MasterOrderActionResult::ConfirmPayment(false));
        assert_eq!(order.billing.state, PaymentState::Paid);
    }
}
