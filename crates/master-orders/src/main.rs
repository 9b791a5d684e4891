//! Walks one school through the life of a master order: two pupils' orders
//! are admitted, withdrawn again, re-admitted, picked in the warehouse and
//! completed.

use master_orders::documents::{DocumentEvent, DocumentType};
use master_orders::lifecycle::{setup_tracing, AggregationSystem};
use master_orders::model::{
    AccountCreate, LineItem, MasterOrderId, MasterStatus, MemberOrderCreate, MemberStatus,
    ProductId, TaxRateId,
};
use master_orders::EngineConfig;
use rust_decimal::Decimal;
use store_actor::StoreClient;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    let _ = dotenvy::dotenv();
    setup_tracing();

    let system = AggregationSystem::with_config(EngineConfig::from_env());
    let result = run(&system).await;
    if let Err(e) = &result {
        error!(error = %e, "Scenario failed");
    }
    system.shutdown().await?;
    result
}

async fn run(system: &AggregationSystem) -> Result<(), String> {
    let school = system
        .accounts
        .create_account(AccountCreate {
            name: "Lindenhof Primary".to_string(),
            pays_centrally: true,
        })
        .await
        .map_err(|e| e.to_string())?;

    let workbook = |qty| {
        LineItem::new(ProductId(7), "Workbook", qty, Decimal::new(450, 2))
            .with_tax(TaxRateId(1), Decimal::new(45, 2) * Decimal::from(qty))
    };
    let pencils = LineItem::new(ProductId(9), "Pencil case", 1, Decimal::new(1200, 2))
        .with_tax(TaxRateId(1), Decimal::new(120, 2));

    let mut orders = Vec::new();
    for items in [vec![workbook(2)], vec![workbook(3), pencils]] {
        let id = system
            .member_orders
            .place_order(MemberOrderCreate {
                account_id: Some(school),
                items,
                status: MemberStatus::Pending,
            })
            .await
            .map_err(|e| e.to_string())?;
        orders.push(id);
    }

    async {
        for &order in &orders {
            system
                .set_member_status(order, MemberStatus::Processing, None)
                .await
                .map_err(|e| e.to_string())?;
        }
        let master = system
            .active_master_for(school)
            .await
            .map_err(|e| e.to_string())?
            .ok_or("no master order after admission")?;
        show(system, master).await
    }
    .instrument(tracing::info_span!("admission"))
    .await?;

    async {
        let first = system
            .set_member_status(orders[0], MemberStatus::Cancelled, Some("Parent cancelled".into()))
            .await
            .map_err(|e| e.to_string())?;
        info!(?first, "First order withdrawn");
        let second = system
            .set_member_status(orders[1], MemberStatus::OnHold, None)
            .await
            .map_err(|e| e.to_string())?;
        info!(?second, "Second order withdrawn");
        let active = system
            .active_master_for(school)
            .await
            .map_err(|e| e.to_string())?;
        info!(?active, "Active master order after both withdrawals");
        Ok::<_, String>(())
    }
    .instrument(tracing::info_span!("removal"))
    .await?;

    async {
        system
            .set_member_status(orders[1], MemberStatus::Processing, None)
            .await
            .map_err(|e| e.to_string())?;
        let master = system
            .active_master_for(school)
            .await
            .map_err(|e| e.to_string())?
            .ok_or("no master order after re-admission")?;

        let slips = DocumentEvent {
            document: DocumentType::PackingSlip,
            masters: vec![master],
        };
        for (id, outcome) in system.document_produced(&slips).await {
            info!(master = %id, ?outcome, "Packing slips printed");
        }

        let blocked = system.transition(master, MasterStatus::Validated).await;
        info!(blocked = blocked.is_err(), "Attempted to reopen the master order");

        let report = system
            .transition(master, MasterStatus::Complete)
            .await
            .map_err(|e| e.to_string())?;
        info!(
            propagated = report.propagated.len(),
            registry_retired = report.registry_retired,
            "Master order completed"
        );
        show(system, master).await
    }
    .instrument(tracing::info_span!("fulfilment"))
    .await?;

    for notice in system.notices() {
        info!(subject = %notice.subject, level = ?notice.level, "{}", notice.message);
    }
    Ok(())
}

async fn show(system: &AggregationSystem, master: MasterOrderId) -> Result<(), String> {
    let members = system.members_of(master).await.map_err(|e| e.to_string())?;
    let order = system
        .master_orders
        .fetch(master)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("master order disappeared")?;
    for line in &order.items {
        info!(product = %line.product_id, quantity = line.quantity, total = %line.total, "Line");
    }
    info!(
        %master,
        status = %order.status,
        members = members.len(),
        total = %order.totals.total,
        "Master order"
    );
    Ok(())
}
