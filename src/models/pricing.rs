use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::line_item::LineItem;

/// Derived totals for a set of line items. Never stored; recomputed from the
/// cart plus a discount percentage whenever it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricingResult {
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub net_total: Decimal,
}

/// Computes subtotal, discount amount, and net total for the given items.
///
/// This is display logic, not a ledger: it is total over its inputs. An
/// out-of-range discount is clamped to [0, 100] rather than rejected, and the
/// discount amount is rounded half-up to whole currency units
/// (`MidpointAwayFromZero`, zero decimal places). Summation is
/// order-independent, so the result is invariant under permutation of `items`.
pub fn compute_totals(items: &[LineItem], discount_percent: Decimal) -> PricingResult {
    let discount_percent = discount_percent.clamp(Decimal::ZERO, Decimal::from(100));

    let subtotal: Decimal = items.iter().map(LineItem::line_total).sum();
    let discount_amount = (subtotal * discount_percent / Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let net_total = subtotal - discount_amount;

    PricingResult {
        subtotal,
        discount_percent,
        discount_amount,
        net_total,
    }
}
