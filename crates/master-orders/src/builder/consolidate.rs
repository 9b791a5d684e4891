//! Line consolidation shared by the incremental merge and the full rebuild.
//!
//! Both paths fold lines keyed by product + variation into the first line seen
//! for that key and then stable-sort by product id, so folding the same
//! members one at a time or all at once yields identical lines.

use crate::error::ReconstructionError;
use crate::model::{LineItem, MemberOrder, MemberOrderId, ProductKey};
use std::collections::HashMap;

/// Folds `incoming` into `target`, summing lines that share a key.
pub fn merge_items(target: &mut Vec<LineItem>, incoming: &[LineItem]) {
    let mut index: HashMap<ProductKey, usize> = target
        .iter()
        .enumerate()
        .map(|(position, line)| (line.key(), position))
        .collect();

    for item in incoming {
        match index.get(&item.key()) {
            Some(&position) => target[position].absorb(item),
            None => {
                index.insert(item.key(), target.len());
                target.push(item.clone());
            }
        }
    }
    sort_items(target);
}

/// Stable sort by product id; variations of one product keep their first-seen order.
pub fn sort_items(items: &mut [LineItem]) {
    items.sort_by_key(|item| item.product_id);
}

/// Lines rebuilt from scratch, plus what had to be left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consolidation {
    pub items: Vec<LineItem>,
    pub skipped: Vec<ReconstructionError>,
}

/// Rebuilds master order lines from `members` in the given order.
///
/// Void members contribute nothing. Lines for which `resolves` answers `false`
/// are skipped and reported instead of failing the whole rebuild.
pub fn consolidate<'a, I, F>(members: I, resolves: F) -> Consolidation
where
    I: IntoIterator<Item = &'a MemberOrder>,
    F: Fn(&LineItem) -> bool,
{
    let mut consolidation = Consolidation::default();
    for member in members {
        if member.status.is_void() {
            continue;
        }
        let (usable, unresolved): (Vec<&LineItem>, Vec<&LineItem>) =
            member.items.iter().partition(|item| resolves(item));
        consolidation
            .skipped
            .extend(unresolved.into_iter().map(|item| unresolvable(member.id, item)));
        let usable: Vec<LineItem> = usable.into_iter().cloned().collect();
        merge_items(&mut consolidation.items, &usable);
    }
    consolidation
}

fn unresolvable(member: MemberOrderId, item: &LineItem) -> ReconstructionError {
    ReconstructionError::UnresolvableProduct {
        member,
        product: item.product_id,
        variation: item.variation_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberStatus, OrderTotals, ProductId, TaxRateId, VariationId};
    use rust_decimal::Decimal;

    fn line(product: u64, quantity: u32) -> LineItem {
        LineItem::new(ProductId(product), format!("product {product}"), quantity, Decimal::new(250, 2))
            .with_tax(TaxRateId(1), Decimal::new(50, 2) * Decimal::from(quantity))
    }

    fn member(id: u64, status: MemberStatus, items: Vec<LineItem>) -> MemberOrder {
        MemberOrder::new(MemberOrderId(id), None, items, status)
    }

    #[test]
    fn merge_sums_shared_keys_and_sorts_by_product() {
        let mut target = vec![line(9, 1)];
        merge_items(&mut target, &[line(7, 2), line(9, 3)]);

        let keys: Vec<(u64, u32)> = target.iter().map(|l| (l.product_id.0, l.quantity)).collect();
        assert_eq!(keys, vec![(7, 2), (9, 4)]);
        assert_eq!(target[1].taxes[&TaxRateId(1)], Decimal::new(200, 2));
    }

    #[test]
    fn variations_stay_on_separate_lines() {
        let mut target = Vec::new();
        merge_items(
            &mut target,
            &[
                line(7, 1).with_variation(VariationId(2)),
                line(7, 1).with_variation(VariationId(1)),
                line(7, 4).with_variation(VariationId(2)),
            ],
        );

        let keys: Vec<(u64, u32)> = target.iter().map(|l| (l.variation_id.0, l.quantity)).collect();
        assert_eq!(keys, vec![(2, 5), (1, 1)]);
    }

    #[test]
    fn incremental_merge_matches_full_rebuild() {
        let members = vec![
            member(1, MemberStatus::Processing, vec![line(9, 1), line(7, 2)]),
            member(2, MemberStatus::Reviewed, vec![line(7, 3), line(4, 1)]),
            member(3, MemberStatus::Processing, vec![line(9, 2)]),
        ];

        let mut incremental = Vec::new();
        for m in &members {
            merge_items(&mut incremental, &m.items);
        }
        let rebuilt = consolidate(&members, |_| true);

        assert_eq!(rebuilt.items, incremental);
        assert_eq!(OrderTotals::of(&rebuilt.items).item_count, 9);
    }

    #[test]
    fn rebuild_skips_void_members_and_reports_unresolvable_lines() {
        let members = vec![
            member(1, MemberStatus::Processing, vec![line(7, 2), line(8, 1)]),
            member(2, MemberStatus::Cancelled, vec![line(7, 10)]),
        ];

        let rebuilt = consolidate(&members, |item| item.product_id != ProductId(8));

        assert_eq!(rebuilt.items.len(), 1);
        assert_eq!(rebuilt.items[0].quantity, 2);
        assert_eq!(
            rebuilt.skipped,
            vec![ReconstructionError::UnresolvableProduct {
                member: MemberOrderId(1),
                product: ProductId(8),
                variation: VariationId(0),
            }]
        );
    }
}
