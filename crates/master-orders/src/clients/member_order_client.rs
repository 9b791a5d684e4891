//! # Member Order Client
//!
//! Provides a high‑level API for interacting with the `MemberOrder` actor.
use crate::member_order_actor::{
    Link, MemberOrderAction, MemberOrderActionResult, MemberOrderError, StatusChange,
};
use crate::model::{MasterOrderId, MemberOrder, MemberOrderCreate, MemberOrderId, MemberStatus};
use async_trait::async_trait;
use store_actor::{RecordClient, StoreClient, StoreError};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct MemberOrderClient {
    inner: RecordClient<MemberOrder>,
}

impl MemberOrderClient {
    pub fn new(inner: RecordClient<MemberOrder>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StoreClient<MemberOrder> for MemberOrderClient {
    type Error = MemberOrderError;

    fn inner(&self) -> &RecordClient<MemberOrder> {
        &self.inner
    }

    fn map_error(e: StoreError) -> Self::Error {
        e.into()
    }
}

impl MemberOrderClient {
    #[instrument(skip(self, params), fields(account = ?params.account_id))]
    pub async fn place_order(
        &self,
        params: MemberOrderCreate,
    ) -> Result<MemberOrderId, MemberOrderError> {
        debug!(?params, "place_order called");
        Ok(self.inner.create(params).await?)
    }

    async fn act(
        &self,
        id: MemberOrderId,
        action: MemberOrderAction,
    ) -> Result<MemberOrderActionResult, MemberOrderError> {
        debug!(%id, ?action, "Sending action");
        Ok(self.inner.perform_action(id, action).await?)
    }

    #[instrument(skip(self))]
    pub async fn link_master(
        &self,
        id: MemberOrderId,
        master: MasterOrderId,
    ) -> Result<Link, MemberOrderError> {
        match self.act(id, MemberOrderAction::LinkMaster(master)).await? {
            MemberOrderActionResult::LinkMaster(link) => Ok(link),
            _ => Err(MemberOrderError::UnexpectedReply("LinkMaster")),
        }
    }

    /// Clears the back-reference if it still points at `master`.
    #[instrument(skip(self))]
    pub async fn unlink_master(
        &self,
        id: MemberOrderId,
        master: MasterOrderId,
    ) -> Result<bool, MemberOrderError> {
        match self.act(id, MemberOrderAction::UnlinkMaster(master)).await? {
            MemberOrderActionResult::UnlinkMaster(cleared) => Ok(cleared),
            _ => Err(MemberOrderError::UnexpectedReply("UnlinkMaster")),
        }
    }

    #[instrument(skip(self, note))]
    pub async fn change_status(
        &self,
        id: MemberOrderId,
        status: MemberStatus,
        note: Option<String>,
    ) -> Result<StatusChange, MemberOrderError> {
        match self
            .act(id, MemberOrderAction::ChangeStatus { status, note })
            .await?
        {
            MemberOrderActionResult::ChangeStatus(change) => Ok(change),
            _ => Err(MemberOrderError::UnexpectedReply("ChangeStatus")),
        }
    }

    #[instrument(skip(self, message))]
    pub async fn add_note(
        &self,
        id: MemberOrderId,
        message: impl Into<String>,
    ) -> Result<(), MemberOrderError> {
        match self.act(id, MemberOrderAction::AddNote(message.into())).await? {
            MemberOrderActionResult::AddNote(()) => Ok(()),
            _ => Err(MemberOrderError::UnexpectedReply("AddNote")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_actor::mock::{create_mock_client, expect_action};

    #[tokio::test]
    async fn link_master_sends_the_action_and_returns_the_link() {
        let (client, mut receiver) = create_mock_client::<MemberOrder>(10);
        let orders = MemberOrderClient::new(client);

        let task =
            tokio::spawn(async move { orders.link_master(MemberOrderId(3), MasterOrderId(1)).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, MemberOrderId(3));
        assert!(matches!(action, MemberOrderAction::LinkMaster(MasterOrderId(1))));
        responder
            .send(Ok(MemberOrderActionResult::LinkMaster(Link::Linked)))
            .unwrap();

        assert_eq!(task.await.unwrap(), Ok(Link::Linked));
    }

    #[tokio::test]
    async fn mismatched_reply_is_an_error_not_a_panic() {
        let (client, mut receiver) = create_mock_client::<MemberOrder>(10);
        let orders = MemberOrderClient::new(client);

        let task = tokio::spawn(async move { orders.add_note(MemberOrderId(3), "hi").await });

        let (_, _, responder) = expect_action(&mut receiver).await.unwrap();
        responder
            .send(Ok(MemberOrderActionResult::UnlinkMaster(true)))
            .unwrap();

        assert_eq!(
            task.await.unwrap(),
            Err(MemberOrderError::UnexpectedReply("AddNote"))
        );
    }
}
