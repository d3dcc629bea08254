use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::line_item::LineItem;
use super::pricing::{compute_totals, PricingResult};

/// An ordered collection of line items, unique by variant code.
///
/// Adding a variant that is already present merges quantities instead of
/// appending a duplicate entry, so `len()` always equals the number of
/// distinct variant codes. Carts are plain values; durability is the cart
/// store's concern (see `services::carts`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, variant_code: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.variant_code == variant_code)
    }

    /// Adds an item, merging quantities when the variant is already present.
    /// A non-positive quantity is rejected as a no-op and returns `false`.
    pub fn add_item(&mut self, item: LineItem) -> bool {
        if item.quantity <= 0 {
            warn!(
                variant_code = %item.variant_code,
                quantity = item.quantity,
                "Rejected cart add with non-positive quantity"
            );
            return false;
        }

        match self
            .items
            .iter_mut()
            .find(|existing| existing.variant_code == item.variant_code)
        {
            Some(existing) => existing.quantity += item.quantity,
            None => self.items.push(item),
        }
        true
    }

    /// Applies `add_item` for each entry. Rejected entries are skipped, never
    /// aborting the batch. Returns how many entries were applied.
    pub fn add_multiple(&mut self, items: impl IntoIterator<Item = LineItem>) -> usize {
        items
            .into_iter()
            .filter(|item| self.add_item(item.clone()))
            .count()
    }

    /// Removes the matching entry. Absent variant codes are a no-op, not an
    /// error; returns whether anything was removed.
    pub fn remove_item(&mut self, variant_code: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.variant_code != variant_code);
        self.items.len() < before
    }

    /// Replaces the quantity of an existing entry. Values below 1 are clamped
    /// to 1: decrementing never drops an item out of the cart, removal is
    /// explicit only. Returns `false` when the variant is not in the cart.
    pub fn set_quantity(&mut self, variant_code: &str, quantity: i32) -> bool {
        match self
            .items
            .iter_mut()
            .find(|item| item.variant_code == variant_code)
        {
            Some(item) => {
                item.quantity = quantity.max(1);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn totals(&self, discount_percent: Decimal) -> PricingResult {
        compute_totals(&self.items, discount_percent)
    }
}
