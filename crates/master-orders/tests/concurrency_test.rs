mod common;

use common::*;
use master_orders::lifecycle::AggregationSystem;
use master_orders::membership::{AdmitOutcome, RemovalOutcome};
use master_orders::model::{MasterStatus, MemberStatus};
use std::collections::HashSet;
use std::sync::Arc;
use store_actor::StoreClient;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_burst_of_admissions_allocates_one_master_order() {
    let system = Arc::new(AggregationSystem::new());
    let account = school(&system, true).await;

    let mut members = Vec::new();
    for i in 0..20 {
        members.push(place(&system, account, vec![line(7, 1), line(100 + i, 2)]).await);
    }

    let mut tasks = Vec::new();
    for id in members.clone() {
        let system = system.clone();
        tasks.push(tokio::spawn(async move {
            system
                .set_member_status(id, MemberStatus::Processing, None)
                .await
        }));
    }
    for task in tasks {
        task.await.expect("task panicked").expect("admission failed");
    }

    let masters = system
        .master_orders
        .list(move |m| m.account_id == account)
        .await
        .expect("Failed to list master orders");
    assert_eq!(masters.len(), 1);
    let order = &masters[0];
    assert_eq!(active_master(&system, account).await, order.id);

    let listed: HashSet<_> = order.members.iter().copied().collect();
    assert_eq!(order.members.len(), 20);
    assert_eq!(listed, members.iter().copied().collect());
    assert_eq!(order.totals.item_count, 20 + 40);
    assert_eq!(order.items.len(), 21);
    assert_eq!(order.items[0].quantity, 20);

    for id in members {
        assert_eq!(member(&system, id).await.master_order, Some(order.id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn accounts_allocate_independently() {
    let system = Arc::new(AggregationSystem::new());

    let mut accounts = Vec::new();
    let mut tasks = Vec::new();
    for _ in 0..5 {
        let account = school(&system, true).await;
        accounts.push(account);
        for _ in 0..4 {
            let id = place(&system, account, vec![line(7, 1)]).await;
            let system = system.clone();
            tasks.push(tokio::spawn(async move {
                system
                    .member_orders
                    .change_status(id, MemberStatus::Processing, None)
                    .await
                    .expect("Failed to change status");
                system.admit(id).await
            }));
        }
    }
    for task in tasks {
        let outcome = task.await.expect("task panicked").expect("admission failed");
        assert!(matches!(outcome, AdmitOutcome::Admitted { .. }));
    }

    let mut seen = HashSet::new();
    for account in accounts {
        let id = active_master(&system, account).await;
        assert!(seen.insert(id), "two accounts share {id}");
        let order = master(&system, id).await;
        assert_eq!(order.account_id, account);
        assert_eq!(order.members.len(), 4);
        assert_eq!(quantities(&order), vec![(7, 4)]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_removals_of_one_member_remove_it_once() {
    let system = Arc::new(AggregationSystem::new());
    let account = school(&system, true).await;

    let m1 = place(&system, account, vec![line(7, 2)]).await;
    let m2 = place(&system, account, vec![line(9, 1)]).await;
    make_admissible(&system, m1).await;
    make_admissible(&system, m2).await;
    let id = active_master(&system, account).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let system = system.clone();
        tasks.push(tokio::spawn(async move { system.remove(m1).await }));
    }
    let mut removed = 0;
    for task in tasks {
        match task.await.expect("task panicked").expect("removal failed") {
            RemovalOutcome::Removed { master, .. } => {
                assert_eq!(master, id);
                removed += 1;
            }
            RemovalOutcome::InProgress | RemovalOutcome::NotLinked => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(removed, 1);
    let order = master(&system, id).await;
    assert_eq!(order.members, vec![m2]);
    assert_eq!(quantities(&order), vec![(9, 1)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn admissions_racing_a_transition_keep_membership_consistent() {
    let system = Arc::new(AggregationSystem::new());
    let account = school(&system, true).await;

    let first = place(&system, account, vec![line(7, 1)]).await;
    make_admissible(&system, first).await;
    let sealed = active_master(&system, account).await;

    let mut members = vec![first];
    for _ in 0..12 {
        members.push(place(&system, account, vec![line(7, 1)]).await);
    }

    let mut tasks = Vec::new();
    for id in members[1..].iter().copied() {
        let system = system.clone();
        tasks.push(tokio::spawn(async move {
            system
                .set_member_status(id, MemberStatus::Processing, None)
                .await
                .map(|_| ())
        }));
    }
    {
        let system = system.clone();
        tasks.push(tokio::spawn(async move {
            system
                .transition(sealed, MasterStatus::Warehouse)
                .await
                .map(|_| ())
        }));
    }
    for task in tasks {
        task.await.expect("task panicked").expect("operation failed");
    }

    // Every member is listed by exactly the master order it points at.
    let masters = system
        .master_orders
        .list(move |m| m.account_id == account)
        .await
        .unwrap();
    let mut listed = HashSet::new();
    for order in &masters {
        for id in &order.members {
            assert!(listed.insert(*id), "{id} listed twice");
            assert_eq!(member(&system, *id).await.master_order, Some(order.id));
        }
        let units: u32 = order.items.iter().map(|i| i.quantity).sum();
        assert_eq!(units as usize, order.members.len());
    }
    assert_eq!(listed, members.iter().copied().collect());

    // At most one master order still accepts members, and it is the active one.
    let open: Vec<_> = masters.iter().filter(|m| m.status.is_initial()).collect();
    assert!(open.len() <= 1);
    if let Some(open) = open.first() {
        assert_eq!(active_master(&system, account).await, open.id);
    }
    assert_eq!(master(&system, sealed).await.status, MasterStatus::Warehouse);
}
