//! # Master Order Client
//!
//! Provides a high‑level API for interacting with the `MasterOrder` actor.
use crate::master_order_actor::{
    MasterOrderAction, MasterOrderActionResult, MasterOrderError, Merged, TransitionRecord,
};
use crate::model::{
    LineItem, MasterOrder, MasterOrderCreate, MasterOrderId, MasterStatus, MemberOrderId,
    OrderTotals,
};
use async_trait::async_trait;
use store_actor::{RecordClient, StoreClient, StoreError};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct MasterOrderClient {
    inner: RecordClient<MasterOrder>,
}

impl MasterOrderClient {
    pub fn new(inner: RecordClient<MasterOrder>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StoreClient<MasterOrder> for MasterOrderClient {
    type Error = MasterOrderError;

    fn inner(&self) -> &RecordClient<MasterOrder> {
        &self.inner
    }

    fn map_error(e: StoreError) -> Self::Error {
        e.into()
    }
}

impl MasterOrderClient {
    #[instrument(skip(self))]
    pub async fn open(&self, params: MasterOrderCreate) -> Result<MasterOrderId, MasterOrderError> {
        debug!("Sending request");
        Ok(self.inner.create(params).await?)
    }

    async fn act(
        &self,
        id: MasterOrderId,
        action: MasterOrderAction,
    ) -> Result<MasterOrderActionResult, MasterOrderError> {
        debug!(%id, ?action, "Sending action");
        Ok(self.inner.perform_action(id, action).await?)
    }

    #[instrument(skip(self, items))]
    pub async fn merge_member(
        &self,
        id: MasterOrderId,
        member: MemberOrderId,
        items: Vec<LineItem>,
    ) -> Result<Merged, MasterOrderError> {
        match self.act(id, MasterOrderAction::Merge { member, items }).await? {
            MasterOrderActionResult::Merge(merged) => Ok(merged),
            _ => Err(MasterOrderError::UnexpectedReply("Merge")),
        }
    }

    /// Replaces the lines; fails if `members` is no longer the membership list.
    #[instrument(skip(self, items))]
    pub async fn rebuild(
        &self,
        id: MasterOrderId,
        members: Vec<MemberOrderId>,
        items: Vec<LineItem>,
    ) -> Result<OrderTotals, MasterOrderError> {
        match self.act(id, MasterOrderAction::Rebuild { members, items }).await? {
            MasterOrderActionResult::Rebuild(totals) => Ok(totals),
            _ => Err(MasterOrderError::UnexpectedReply("Rebuild")),
        }
    }

    /// Returns the remaining members.
    #[instrument(skip(self))]
    pub async fn drop_member(
        &self,
        id: MasterOrderId,
        member: MemberOrderId,
    ) -> Result<Vec<MemberOrderId>, MasterOrderError> {
        match self.act(id, MasterOrderAction::DropMember(member)).await? {
            MasterOrderActionResult::DropMember(remaining) => Ok(remaining),
            _ => Err(MasterOrderError::UnexpectedReply("DropMember")),
        }
    }

    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        id: MasterOrderId,
        to: MasterStatus,
    ) -> Result<TransitionRecord, MasterOrderError> {
        match self.act(id, MasterOrderAction::Transition(to)).await? {
            MasterOrderActionResult::Transition(record) => Ok(record),
            _ => Err(MasterOrderError::UnexpectedReply("Transition")),
        }
    }

    #[instrument(skip(self, message))]
    pub async fn add_note(
        &self,
        id: MasterOrderId,
        message: impl Into<String>,
    ) -> Result<(), MasterOrderError> {
        match self.act(id, MasterOrderAction::AddNote(message.into())).await? {
            MasterOrderActionResult::AddNote(()) => Ok(()),
            _ => Err(MasterOrderError::UnexpectedReply("AddNote")),
        }
    }

    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, id: MasterOrderId) -> Result<bool, MasterOrderError> {
        match self.act(id, MasterOrderAction::ConfirmPayment).await? {
            MasterOrderActionResult::ConfirmPayment(settled) => Ok(settled),
            _ => Err(MasterOrderError::UnexpectedReply("ConfirmPayment")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidTransitionError;
    use store_actor::mock::MockClient;

    #[tokio::test]
    async fn rejected_transition_surfaces_as_invalid_transition() {
        let mut mock = MockClient::<MasterOrder>::new();
        let rejection = InvalidTransitionError {
            master: MasterOrderId(2),
            from: MasterStatus::Prepared,
            to: MasterStatus::Validated,
        };
        mock.expect_action()
            .return_err(StoreError::Rejected(Box::new(MasterOrderError::from(
                rejection.clone(),
            ))));
        let masters = MasterOrderClient::new(mock.client());

        let err = masters
            .transition(MasterOrderId(2), MasterStatus::Validated)
            .await
            .unwrap_err();

        assert_eq!(err, MasterOrderError::InvalidTransition(rejection));
        mock.verify();
    }

    #[tokio::test]
    async fn missing_rows_map_to_not_found() {
        let mut mock = MockClient::<MasterOrder>::new();
        mock.expect_action()
            .return_err(StoreError::NotFound("master_9".into()));
        let masters = MasterOrderClient::new(mock.client());

        let err = masters
            .merge_member(MasterOrderId(9), MemberOrderId(1), Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err, MasterOrderError::NotFound("master_9".into()));
        assert!(err.is_stale_target());
    }
}
