#![allow(dead_code)]

use master_orders::lifecycle::AggregationSystem;
use master_orders::model::{
    AccountCreate, AccountId, LineItem, MasterOrder, MasterOrderId, MemberOrder,
    MemberOrderCreate, MemberOrderId, MemberStatus, ProductId, TaxRateId, VariationId,
};
use rust_decimal::Decimal;
use store_actor::StoreClient;

pub async fn school(system: &AggregationSystem, pays_centrally: bool) -> AccountId {
    system
        .accounts
        .create_account(AccountCreate {
            name: "Lindenhof Primary".to_string(),
            pays_centrally,
        })
        .await
        .expect("Failed to create account")
}

/// A line of `quantity` units at 2.50 with 10% tax.
pub fn line(product: u64, quantity: u32) -> LineItem {
    LineItem::new(
        ProductId(product),
        format!("product {product}"),
        quantity,
        Decimal::new(250, 2),
    )
    .with_tax(TaxRateId(1), Decimal::new(25, 2) * Decimal::from(quantity))
}

pub fn variant(product: u64, variation: u64, quantity: u32) -> LineItem {
    line(product, quantity).with_variation(VariationId(variation))
}

pub async fn place(
    system: &AggregationSystem,
    account: AccountId,
    items: Vec<LineItem>,
) -> MemberOrderId {
    system
        .member_orders
        .place_order(MemberOrderCreate {
            account_id: Some(account),
            items,
            status: MemberStatus::Pending,
        })
        .await
        .expect("Failed to place order")
}

pub async fn make_admissible(system: &AggregationSystem, member: MemberOrderId) {
    system
        .set_member_status(member, MemberStatus::Processing, None)
        .await
        .expect("Failed to admit");
}

pub async fn master(system: &AggregationSystem, id: MasterOrderId) -> MasterOrder {
    system
        .master_orders
        .fetch(id)
        .await
        .expect("Failed to get master order")
        .expect("Master order not found")
}

pub async fn member(system: &AggregationSystem, id: MemberOrderId) -> MemberOrder {
    system
        .member_orders
        .fetch(id)
        .await
        .expect("Failed to get member order")
        .expect("Member order not found")
}

pub async fn active_master(system: &AggregationSystem, account: AccountId) -> MasterOrderId {
    system
        .active_master_for(account)
        .await
        .expect("Failed to read registry")
        .expect("No active master order")
}

/// `(product, quantity)` per line, in line order.
pub fn quantities(order: &MasterOrder) -> Vec<(u64, u32)> {
    order
        .items
        .iter()
        .map(|line| (line.product_id.0, line.quantity))
        .collect()
}
