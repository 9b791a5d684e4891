//! # Mock Store & Testing Guide
//!
//! `MockClient<T>` hands out a real [`RecordClient<T>`] whose requests are
//! answered from a queue of expectations instead of a running
//! [`RecordActor`](crate::RecordActor). Use it to inject failures that are hard
//! to provoke with real state: a store that goes away mid-transaction, a row
//! that rejects an action, an insert that never lands.
//!
//! | | MockClient | Real actor |
//! |---|---|---|
//! | **State** | none, canned replies | real rows |
//! | **Determinism** | fully scripted | subject to the scheduler |
//! | **Error injection** | `return_err` | requires crafted state |
//!
//! ```rust
//! use store_actor::mock::MockClient;
//! use store_actor::{Record, StoreError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Row { id: u64 }
//! #[derive(Debug)] struct RowCreate;
//! #[derive(Debug)] enum RowAction {}
//! #[derive(Debug, thiserror::Error)] #[error("row error")] struct RowError;
//!
//! #[async_trait]
//! impl Record for Row {
//!     type Id = u64; type Create = RowCreate; type Update = ();
//!     type Action = RowAction; type ActionResult = (); type Context = (); type Error = RowError;
//!     fn from_create_params(id: u64, _: RowCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
//!     async fn on_update(&mut self, _: (), _: &()) -> Result<(), Self::Error> { Ok(()) }
//!     async fn handle_action(&mut self, _: RowAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Row>::new();
//!     mock.expect_create().return_err(StoreError::ActorClosed);
//!
//!     let result = mock.client().create(RowCreate).await;
//!     assert!(matches!(result, Err(StoreError::ActorClosed)));
//!     mock.verify();
//! }
//! ```
//!
//! For hand-driven tests, [`create_mock_client`] returns the client together
//! with the raw request receiver, and [`expect_action`] pulls the next action
//! off it with its responder.

use crate::client::RecordClient;
use crate::entity::Record;
use crate::error::StoreError;
use crate::message::{StoreRequest, Upserted};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One queued reply, matched against the next incoming request.
enum Expectation<T: Record> {
    Get(Result<Option<T>, StoreError>),
    Find(Result<Vec<T>, StoreError>),
    Create(Result<T::Id, StoreError>),
    Upsert(Result<Upserted<T>, StoreError>),
    Update(Result<T, StoreError>),
    Delete(Result<(), StoreError>),
    Action(Result<T::ActionResult, StoreError>),
}

impl<T: Record> Expectation<T> {
    fn kind(&self) -> &'static str {
        match self {
            Expectation::Get(_) => "Get",
            Expectation::Find(_) => "Find",
            Expectation::Create(_) => "Create",
            Expectation::Upsert(_) => "Upsert",
            Expectation::Update(_) => "Update",
            Expectation::Delete(_) => "Delete",
            Expectation::Action(_) => "Action",
        }
    }
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A scripted store with expectation tracking.
pub struct MockClient<T: Record> {
    client: RecordClient<T>,
    expectations: Queue<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: Record> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MockClient<T> {
    /// Creates a mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = queue.lock().unwrap().pop_front();
                match (request, next) {
                    (StoreRequest::Get { respond_to, .. }, Some(Expectation::Get(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (StoreRequest::Find { respond_to, .. }, Some(Expectation::Find(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (StoreRequest::Create { respond_to, .. }, Some(Expectation::Create(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (StoreRequest::Upsert { respond_to, .. }, Some(Expectation::Upsert(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (StoreRequest::Update { respond_to, .. }, Some(Expectation::Update(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (StoreRequest::Delete { respond_to, .. }, Some(Expectation::Delete(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (StoreRequest::Action { respond_to, .. }, Some(Expectation::Action(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (request, expected) => {
                        panic!(
                            "Unexpected request {:?}, expected {}",
                            request,
                            expected.map(|e| e.kind()).unwrap_or("nothing")
                        );
                    }
                }
            }
        });

        Self {
            client: RecordClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> RecordClient<T> {
        self.client.clone()
    }

    pub fn expect_get(&mut self) -> ExpectationBuilder<T, Option<T>> {
        self.builder(Expectation::Get)
    }

    pub fn expect_find(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(Expectation::Find)
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::Id> {
        self.builder(Expectation::Create)
    }

    pub fn expect_upsert(&mut self) -> ExpectationBuilder<T, Upserted<T>> {
        self.builder(Expectation::Upsert)
    }

    pub fn expect_update(&mut self) -> ExpectationBuilder<T, T> {
        self.builder(Expectation::Update)
    }

    pub fn expect_delete(&mut self) -> ExpectationBuilder<T, ()> {
        self.builder(Expectation::Delete)
    }

    pub fn expect_action(&mut self) -> ExpectationBuilder<T, T::ActionResult> {
        self.builder(Expectation::Action)
    }

    fn builder<R>(
        &self,
        wrap: fn(Result<R, StoreError>) -> Expectation<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            wrap,
            expectations: self.expectations.clone(),
        }
    }

    /// Number of expectations not yet consumed.
    pub fn remaining(&self) -> usize {
        self.expectations.lock().unwrap().len()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let remaining = self.remaining();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Queues the reply for one expected request.
pub struct ExpectationBuilder<T: Record, R> {
    wrap: fn(Result<R, StoreError>) -> Expectation<T>,
    expectations: Queue<T>,
}

impl<T: Record, R> ExpectationBuilder<T, R> {
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    pub fn return_err(self, error: StoreError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, StoreError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back((self.wrap)(response));
    }
}

/// Creates a client and the receiver its requests arrive on.
pub fn create_mock_client<T: Record>(
    buffer_size: usize,
) -> (RecordClient<T>, mpsc::Receiver<StoreRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (RecordClient::new(sender), receiver)
}

/// Pulls the next request off `receiver` if it is an Action.
pub async fn expect_action<T: Record>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    tokio::sync::oneshot::Sender<Result<T::ActionResult, StoreError>>,
)> {
    match receiver.recv().await {
        Some(StoreRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Ticket {
        id: u64,
        seats: u32,
    }

    #[derive(Debug)]
    struct TicketCreate {
        seats: u32,
    }

    #[derive(Debug)]
    enum TicketAction {
        Hold(u32),
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Ticket error")]
    struct TicketError;

    #[async_trait]
    impl Record for Ticket {
        type Id = u64;
        type Create = TicketCreate;
        type Update = ();
        type Action = TicketAction;
        type ActionResult = u32;
        type Context = ();
        type Error = TicketError;

        fn from_create_params(id: u64, params: TicketCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                seats: params.seats,
            })
        }

        async fn on_update(&mut self, _: (), _: &()) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn handle_action(&mut self, action: TicketAction, _: &()) -> Result<u32, Self::Error> {
            match action {
                TicketAction::Hold(n) => Ok(n),
            }
        }
    }

    #[tokio::test]
    async fn scripted_replies_are_served_in_order() {
        let mut mock = MockClient::<Ticket>::new();
        mock.expect_create().return_ok(4);
        mock.expect_get().return_ok(Some(Ticket { id: 4, seats: 2 }));
        mock.expect_upsert()
            .return_ok(Upserted::Untouched(Ticket { id: 4, seats: 2 }));

        let client = mock.client();
        assert_eq!(client.create(TicketCreate { seats: 2 }).await.unwrap(), 4);
        assert_eq!(client.get(4).await.unwrap().unwrap().seats, 2);
        let upserted = client.upsert(4, TicketCreate { seats: 9 }).await.unwrap();
        assert!(!upserted.wrote());

        mock.verify();
    }

    #[tokio::test]
    async fn injected_errors_reach_the_caller() {
        let mut mock = MockClient::<Ticket>::new();
        mock.expect_delete().return_err(StoreError::NotFound("4".into()));

        let result = mock.client().delete(4).await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "4"));
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn hand_driven_action_round_trip() {
        let (client, mut receiver) = create_mock_client::<Ticket>(4);
        let task = tokio::spawn(async move { client.perform_action(7, TicketAction::Hold(3)).await });

        let (id, action, responder) = expect_action(&mut receiver).await.expect("action request");
        assert_eq!(id, 7);
        assert!(matches!(action, TicketAction::Hold(3)));
        responder.send(Ok(3)).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), 3);
    }
}
