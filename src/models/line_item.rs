use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A single product variant in a cart or order.
///
/// `variant_code` identifies a concrete product configuration (color, weight,
/// size) and is the dedup key within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub variant_code: String,
    pub product_id: Uuid,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub color_or_weight: String,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        let item = LineItem {
            variant_code: "CEM-50KG".into(),
            product_id: Uuid::new_v4(),
            unit_price: dec!(1000),
            quantity: 3,
            color_or_weight: "50kg".into(),
        };
        assert_eq!(item.line_total(), dec!(3000));
    }
}
