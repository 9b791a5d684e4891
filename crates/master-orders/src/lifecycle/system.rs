use crate::allocation::AllocationCoordinator;
use crate::builder::{Builder, OpenCatalog, ProductCatalog};
use crate::clients::{AccountClient, MasterOrderClient, MemberOrderClient, RegistryClient};
use crate::config::EngineConfig;
use crate::documents::{DocumentEvent, DocumentOutcome, DocumentTrigger};
use crate::error::EngineError;
use crate::locks::NamedLocks;
use crate::member_order_actor::MemberOrderError;
use crate::membership::{AdmitOutcome, MembershipChange, MembershipManager, RemovalOutcome};
use crate::model::{
    AccountId, MasterOrder, MasterOrderId, MasterStatus, MemberOrder, MemberOrderId, MemberStatus,
};
use crate::notify::{Fanout, MemorySink, Notice, TracingSink};
use crate::status_machine::{
    BulkTransitionReport, MasterStatusChanged, StatusMachine, TransitionReport,
};
use crate::{account_actor, master_order_actor, member_order_actor, registry_actor};
use std::sync::Arc;
use store_actor::StoreClient;
use tokio::sync::broadcast;
use tracing::{error, info};

const EVENT_CAPACITY: usize = 256;

/// The running aggregation engine.
///
/// Owns one record actor per record type and the engine components wired on
/// top of them. The record clients are public so callers can place orders
/// and inspect rows directly; everything that changes membership or status
/// goes through the methods below.
///
/// # Example
///
/// ```ignore
/// let system = AggregationSystem::new();
///
/// let account = system.accounts.create_account(school).await?;
/// let order = system.member_orders.place_order(order).await?;
/// system.set_member_status(order, MemberStatus::Processing, None).await?;
///
/// system.shutdown().await?;
/// ```
pub struct AggregationSystem {
    pub accounts: AccountClient,
    pub member_orders: MemberOrderClient,
    pub master_orders: MasterOrderClient,
    pub registry: RegistryClient,

    membership: MembershipManager,
    machine: StatusMachine,
    documents: DocumentTrigger,
    notices: MemorySink,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Default for AggregationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationSystem {
    /// Starts the engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_catalog(config, Arc::new(OpenCatalog))
    }

    /// Starts the engine, resolving products through `catalog` during rebuilds.
    pub fn with_catalog(config: EngineConfig, catalog: Arc<dyn ProductCatalog>) -> Self {
        let buffer = config.actor_buffer_size;

        // 1. Create actors (no dependencies)
        let (account_actor, accounts) = account_actor::new(buffer);
        let (member_actor, member_orders) = member_order_actor::new(buffer);
        let (master_actor, master_orders) = master_order_actor::new(buffer);
        let (registry_actor, registry) = registry_actor::new(buffer);

        // 2. Start actors; none needs a context
        let handles = vec![
            tokio::spawn(account_actor.run(())),
            tokio::spawn(member_actor.run(())),
            tokio::spawn(master_actor.run(())),
            tokio::spawn(registry_actor.run(())),
        ];

        // 3. Wire the engine
        let locks = NamedLocks::new();
        let notices = MemorySink::new();
        let notifier = Arc::new(
            Fanout::new()
                .with(Arc::new(TracingSink))
                .with(Arc::new(notices.clone())),
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let allocator = AllocationCoordinator::new(
            registry.clone(),
            master_orders.clone(),
            Arc::new(accounts.clone()),
            locks.clone(),
            &config,
        );
        let builder = Builder::new(member_orders.clone(), master_orders.clone(), catalog);
        let machine = StatusMachine::new(
            master_orders.clone(),
            member_orders.clone(),
            registry.clone(),
            locks.clone(),
            notifier.clone(),
            events,
            &config,
        );
        let membership = MembershipManager::new(
            member_orders.clone(),
            master_orders.clone(),
            registry.clone(),
            allocator,
            builder,
            locks,
            notifier,
            &config,
        );
        let documents = DocumentTrigger::new(master_orders.clone(), machine.clone());

        info!(
            terminal_propagation = %config.terminal_propagation,
            lock_timeout = ?config.allocation_lock_timeout,
            "Aggregation engine started"
        );

        Self {
            accounts,
            member_orders,
            master_orders,
            registry,
            membership,
            machine,
            documents,
            notices,
            handles,
        }
    }

    pub async fn admit(&self, member: MemberOrderId) -> Result<AdmitOutcome, EngineError> {
        self.membership.admit(member).await
    }

    pub async fn remove(&self, member: MemberOrderId) -> Result<RemovalOutcome, EngineError> {
        self.membership.remove(member).await
    }

    /// Writes a member order's status and lets membership follow it:
    /// becoming admissible admits the order, leaving an admissible status
    /// removes it.
    pub async fn set_member_status(
        &self,
        member: MemberOrderId,
        status: MemberStatus,
        note: Option<String>,
    ) -> Result<MembershipChange, EngineError> {
        let change = self
            .member_orders
            .change_status(member, status, note)
            .await
            .map_err(|e| match e {
                MemberOrderError::NotFound(_) => {
                    EngineError::MemberNotFound(member)
                }
                other => other.into(),
            })?;
        if !change.changed() {
            return Ok(MembershipChange::Unaffected);
        }
        self.membership
            .on_member_status_changed(member, change.from, change.to)
            .await
    }

    pub async fn transition(
        &self,
        master: MasterOrderId,
        to: MasterStatus,
    ) -> Result<TransitionReport, EngineError> {
        self.machine.transition(master, to).await
    }

    pub async fn transition_many(
        &self,
        masters: &[MasterOrderId],
        to: MasterStatus,
    ) -> BulkTransitionReport {
        self.machine.transition_many(masters, to).await
    }

    pub async fn document_produced(
        &self,
        event: &DocumentEvent,
    ) -> Vec<(MasterOrderId, Result<DocumentOutcome, EngineError>)> {
        self.documents.on_document_produced(event).await
    }

    pub async fn confirm_payment(&self, master: MasterOrderId) -> Result<bool, EngineError> {
        Ok(self.master_orders.confirm_payment(master).await?)
    }

    /// The master order a member order currently belongs to.
    pub async fn master_order_for(
        &self,
        member: MemberOrderId,
    ) -> Result<Option<MasterOrder>, EngineError> {
        let order = self
            .member_orders
            .fetch(member)
            .await?
            .ok_or(EngineError::MemberNotFound(member))?;
        let Some(master) = order.master_order else {
            return Ok(None);
        };
        Ok(self
            .master_orders
            .fetch(master)
            .await?
            .filter(|m| m.has_member(member)))
    }

    /// The member orders of a master order, in admission order.
    pub async fn members_of(&self, master: MasterOrderId) -> Result<Vec<MemberOrder>, EngineError> {
        let order = self
            .master_orders
            .fetch(master)
            .await?
            .ok_or(EngineError::MasterNotFound(master))?;
        let mut members = Vec::with_capacity(order.members.len());
        for id in order.members {
            if let Some(member) = self.member_orders.fetch(id).await? {
                members.push(member);
            }
        }
        Ok(members)
    }

    /// The account's active master order according to the registry.
    pub async fn active_master_for(
        &self,
        account: AccountId,
    ) -> Result<Option<MasterOrderId>, EngineError> {
        Ok(self
            .registry
            .fetch(account)
            .await?
            .and_then(|entry| entry.active_master()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MasterStatusChanged> {
        self.machine.subscribe()
    }

    /// Administrative notices recorded so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.notices()
    }

    /// Drops every client, which closes the actor mailboxes, and waits for
    /// the actors to finish.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down aggregation engine...");

        let Self {
            accounts,
            member_orders,
            master_orders,
            registry,
            membership,
            machine,
            documents,
            notices,
            handles,
        } = self;
        drop((membership, machine, documents, notices));
        drop((accounts, member_orders, master_orders, registry));

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Aggregation engine stopped.");
        Ok(())
    }
}
