use async_trait::async_trait;
use store_actor::{Conflict, Record, RecordActor, StoreError, Upserted};

// --- Test Record ---

#[derive(Clone, Debug, PartialEq)]
struct Lease {
    id: u64,
    holder: String,
    active: bool,
    renewals: u32,
}

#[derive(Debug)]
struct LeaseCreate {
    holder: String,
}

#[derive(Debug)]
struct LeaseUpdate {
    holder: Option<String>,
}

#[derive(Debug)]
enum LeaseAction {
    Renew,
    Release,
}

#[derive(Debug, thiserror::Error, PartialEq)]
enum LeaseError {
    #[error("lease is not active")]
    Inactive,
    #[error("holder must not be empty")]
    EmptyHolder,
    #[error("active leases cannot be deleted")]
    StillActive,
}

#[async_trait]
impl Record for Lease {
    type Id = u64;
    type Create = LeaseCreate;
    type Update = LeaseUpdate;
    type Action = LeaseAction;
    type ActionResult = u32;
    type Context = ();
    type Error = LeaseError;

    fn from_create_params(id: u64, params: LeaseCreate) -> Result<Self, Self::Error> {
        if params.holder.is_empty() {
            return Err(LeaseError::EmptyHolder);
        }
        Ok(Self {
            id,
            holder: params.holder,
            active: true,
            renewals: 0,
        })
    }

    async fn on_update(&mut self, update: LeaseUpdate, _ctx: &()) -> Result<(), Self::Error> {
        if let Some(holder) = update.holder {
            // Written before validation on purpose: the store must discard it.
            self.holder = holder;
            if self.holder.is_empty() {
                return Err(LeaseError::EmptyHolder);
            }
        }
        Ok(())
    }

    async fn on_delete(&self, _ctx: &()) -> Result<(), Self::Error> {
        if self.active {
            return Err(LeaseError::StillActive);
        }
        Ok(())
    }

    async fn on_conflict(&mut self, params: LeaseCreate, _ctx: &()) -> Result<Conflict, Self::Error> {
        if self.active {
            return Ok(Conflict::Untouched);
        }
        self.holder = params.holder;
        self.active = true;
        Ok(Conflict::Updated)
    }

    async fn handle_action(&mut self, action: LeaseAction, _ctx: &()) -> Result<u32, Self::Error> {
        match action {
            LeaseAction::Renew => {
                self.renewals += 1;
                if !self.active {
                    return Err(LeaseError::Inactive);
                }
                Ok(self.renewals)
            }
            LeaseAction::Release => {
                self.active = false;
                Ok(self.renewals)
            }
        }
    }
}

fn start() -> store_actor::RecordClient<Lease> {
    let (actor, client) = RecordActor::<Lease>::new(16);
    tokio::spawn(actor.run(()));
    client
}

#[tokio::test]
async fn upsert_inserts_then_respects_the_conflict_clause() {
    let client = start();

    let first = client
        .upsert(42, LeaseCreate { holder: "alpha".into() })
        .await
        .unwrap();
    assert!(matches!(first, Upserted::Inserted(ref l) if l.holder == "alpha"));

    // Active row: left untouched.
    let second = client
        .upsert(42, LeaseCreate { holder: "beta".into() })
        .await
        .unwrap();
    assert!(!second.wrote());
    assert_eq!(second.into_inner().holder, "alpha");

    // Released row: reclaimed.
    client.perform_action(42, LeaseAction::Release).await.unwrap();
    let third = client
        .upsert(42, LeaseCreate { holder: "beta".into() })
        .await
        .unwrap();
    assert!(matches!(third, Upserted::Updated(ref l) if l.holder == "beta" && l.active));
}

#[tokio::test]
async fn concurrent_upserts_have_exactly_one_winner() {
    let client = start();

    let mut handles = Vec::new();
    for n in 0..20 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .upsert(7, LeaseCreate { holder: format!("worker_{n}") })
                .await
                .unwrap()
                .wrote()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn failed_hooks_leave_the_row_unchanged() {
    let client = start();
    let id = client.create(LeaseCreate { holder: "alpha".into() }).await.unwrap();
    client.perform_action(id, LeaseAction::Release).await.unwrap();

    let renew = client.perform_action(id, LeaseAction::Renew).await;
    assert_eq!(
        renew.unwrap_err().rejection::<LeaseError>(),
        Some(&LeaseError::Inactive)
    );

    let update = client
        .update(id, LeaseUpdate { holder: Some(String::new()) })
        .await;
    assert!(update.is_err());

    let row = client.get(id).await.unwrap().unwrap();
    assert_eq!(row.renewals, 0);
    assert_eq!(row.holder, "alpha");
}

#[tokio::test]
async fn create_skips_keys_taken_by_upserts_and_find_is_ordered() {
    let client = start();
    client
        .upsert(1, LeaseCreate { holder: "pinned".into() })
        .await
        .unwrap();

    let a = client.create(LeaseCreate { holder: "a".into() }).await.unwrap();
    let b = client.create(LeaseCreate { holder: "b".into() }).await.unwrap();
    assert_eq!((a, b), (2, 3));

    client.perform_action(a, LeaseAction::Release).await.unwrap();
    let active: Vec<u64> = client
        .find(|l: &Lease| l.active)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(active, vec![1, 3]);
}

#[tokio::test]
async fn delete_can_be_vetoed_and_missing_rows_are_reported() {
    let client = start();
    let id = client.create(LeaseCreate { holder: "alpha".into() }).await.unwrap();

    assert!(client.delete(id).await.is_err());
    client.perform_action(id, LeaseAction::Release).await.unwrap();
    client.delete(id).await.unwrap();
    assert!(client.get(id).await.unwrap().is_none());

    let missing = client.perform_action(id, LeaseAction::Renew).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    let invalid = client.create(LeaseCreate { holder: String::new() }).await;
    assert!(matches!(invalid, Err(StoreError::Rejected(_))));
}
