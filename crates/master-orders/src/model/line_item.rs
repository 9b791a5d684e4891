use crate::model::{ProductId, TaxRateId, VariationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consolidation key: one master order line per product + variation.
pub type ProductKey = (ProductId, VariationId);

/// A single order line. Member orders and master orders share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub variation_id: VariationId,
    pub name: String,
    pub quantity: u32,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub tax: Decimal,
    /// Tax split per rate; sums to `tax`.
    pub taxes: BTreeMap<TaxRateId, Decimal>,
}

impl LineItem {
    /// A tax-free line priced at `unit_price` per unit.
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        let subtotal = unit_price * Decimal::from(quantity);
        Self {
            product_id,
            variation_id: VariationId(0),
            name: name.into(),
            quantity,
            subtotal,
            total: subtotal,
            tax: Decimal::ZERO,
            taxes: BTreeMap::new(),
        }
    }

    pub fn with_variation(mut self, variation_id: VariationId) -> Self {
        self.variation_id = variation_id;
        self
    }

    /// Adds a tax bucket and folds it into `tax` and `total`.
    pub fn with_tax(mut self, rate: TaxRateId, amount: Decimal) -> Self {
        *self.taxes.entry(rate).or_insert(Decimal::ZERO) += amount;
        self.tax += amount;
        self.total += amount;
        self
    }

    pub fn key(&self) -> ProductKey {
        (self.product_id, self.variation_id)
    }

    /// Adds another line with the same key into this one. The unit count
    /// saturates at `u32::MAX`.
    pub fn absorb(&mut self, other: &LineItem) {
        debug_assert_eq!(self.key(), other.key());
        self.quantity = self.quantity.saturating_add(other.quantity);
        self.subtotal += other.subtotal;
        self.total += other.total;
        self.tax += other.tax;
        for (rate, amount) in &other.taxes {
            *self.taxes.entry(*rate).or_insert(Decimal::ZERO) += *amount;
        }
    }
}

/// Money and count totals of a set of lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of quantities.
    pub item_count: u32,
    /// Number of distinct lines.
    pub line_item_count: usize,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn of(items: &[LineItem]) -> Self {
        items.iter().fold(
            Self {
                line_item_count: items.len(),
                ..Self::default()
            },
            |mut acc, item| {
                acc.item_count = acc.item_count.saturating_add(item.quantity);
                acc.subtotal += item.subtotal;
                acc.tax += item.tax;
                acc.total += item.total;
                acc
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_merges_amounts_and_tax_buckets() {
        let mut a = LineItem::new(ProductId(7), "Workbook", 2, Decimal::new(450, 2))
            .with_tax(TaxRateId(1), Decimal::new(90, 2));
        let b = LineItem::new(ProductId(7), "Workbook", 3, Decimal::new(450, 2))
            .with_tax(TaxRateId(1), Decimal::new(135, 2))
            .with_tax(TaxRateId(2), Decimal::new(10, 2));

        a.absorb(&b);

        assert_eq!(a.quantity, 5);
        assert_eq!(a.subtotal, Decimal::new(2250, 2));
        assert_eq!(a.tax, Decimal::new(235, 2));
        assert_eq!(a.total, Decimal::new(2485, 2));
        assert_eq!(a.taxes[&TaxRateId(1)], Decimal::new(225, 2));
        assert_eq!(a.taxes[&TaxRateId(2)], Decimal::new(10, 2));
    }

    #[test]
    fn totals_count_units_and_lines() {
        let items = vec![
            LineItem::new(ProductId(7), "Workbook", 5, Decimal::ONE),
            LineItem::new(ProductId(9), "Pencil case", 1, Decimal::TEN),
        ];
        let totals = OrderTotals::of(&items);
        assert_eq!(totals.item_count, 6);
        assert_eq!(totals.line_item_count, 2);
        assert_eq!(totals.total, Decimal::new(15, 0));
    }

    #[test]
    fn unit_counts_saturate_instead_of_overflowing() {
        let mut a = LineItem::new(ProductId(7), "Workbook", u32::MAX - 1, Decimal::ZERO);
        let b = LineItem::new(ProductId(7), "Workbook", 5, Decimal::ZERO);
        a.absorb(&b);
        assert_eq!(a.quantity, u32::MAX);

        let items = vec![a, LineItem::new(ProductId(9), "Pencil case", 3, Decimal::ZERO)];
        assert_eq!(OrderTotals::of(&items).item_count, u32::MAX);
    }
}
