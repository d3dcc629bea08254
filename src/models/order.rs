use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;

use super::line_item::LineItem;

/// Whether a request creates a customer-facing quotation or a firm order.
/// Quotations move through the same status workflow once created.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderType {
    #[sea_orm(string_value = "quotation")]
    Quotation,
    #[sea_orm(string_value = "order")]
    Order,
}

/// Validated creation payload for the persistence boundary.
///
/// Construction is the only way to obtain one, so any `OrderRequest` that
/// reaches a repository has already passed the preconditions below; the
/// boundary never discovers validation failures late.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: Uuid,
    pub sales_staff_id: Uuid,
    pub items: Vec<LineItem>,
    pub order_type: OrderType,
    pub delivery_date: Option<DateTime<Utc>>,
}

/// A precondition failure, naming the offending field so the caller can
/// render a field-level message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    #[error("customer_id is required")]
    MissingCustomer,

    #[error("sales_staff_id is required")]
    MissingSalesStaff,

    #[error("at least one item is required")]
    EmptyItems,

    #[error("items[{index}]: product_id is required")]
    MissingProduct { index: usize },

    #[error("items[{index}]: quantity must be at least 1")]
    InvalidQuantity { index: usize },
}

impl OrderValidationError {
    /// The request field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingCustomer => "customer_id",
            Self::MissingSalesStaff => "sales_staff_id",
            Self::EmptyItems | Self::MissingProduct { .. } | Self::InvalidQuantity { .. } => {
                "items"
            }
        }
    }
}

impl From<OrderValidationError> for ServiceError {
    fn from(err: OrderValidationError) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl OrderRequest {
    pub fn build(
        customer_id: Uuid,
        sales_staff_id: Uuid,
        items: Vec<LineItem>,
        order_type: OrderType,
        delivery_date: Option<DateTime<Utc>>,
    ) -> Result<Self, OrderValidationError> {
        if customer_id.is_nil() {
            return Err(OrderValidationError::MissingCustomer);
        }
        if sales_staff_id.is_nil() {
            return Err(OrderValidationError::MissingSalesStaff);
        }
        if items.is_empty() {
            return Err(OrderValidationError::EmptyItems);
        }
        for (index, item) in items.iter().enumerate() {
            if item.product_id.is_nil() {
                return Err(OrderValidationError::MissingProduct { index });
            }
            if item.quantity < 1 {
                return Err(OrderValidationError::InvalidQuantity { index });
            }
        }

        Ok(Self {
            customer_id,
            sales_staff_id,
            items,
            order_type,
            delivery_date,
        })
    }

    /// Items serialized for the stored-procedure call.
    pub fn items_json(&self) -> Result<serde_json::Value, ServiceError> {
        serde_json::to_value(&self.items)
            .map_err(|e| ServiceError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn item(quantity: i32) -> LineItem {
        LineItem {
            variant_code: "V1".into(),
            product_id: Uuid::new_v4(),
            unit_price: dec!(100),
            quantity,
            color_or_weight: "blue".into(),
        }
    }

    #[test]
    fn empty_items_are_rejected_with_field() {
        let err = OrderRequest::build(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![],
            OrderType::Order,
            None,
        )
        .unwrap_err();
        assert_eq!(err, OrderValidationError::EmptyItems);
        assert_eq!(err.field(), "items");
        assert!(err.to_string().contains("item"));
    }

    #[test]
    fn nil_customer_is_rejected() {
        let err = OrderRequest::build(
            Uuid::nil(),
            Uuid::new_v4(),
            vec![item(1)],
            OrderType::Quotation,
            None,
        )
        .unwrap_err();
        assert_eq!(err.field(), "customer_id");
    }

    #[test]
    fn nil_sales_staff_is_rejected() {
        let err = OrderRequest::build(
            Uuid::new_v4(),
            Uuid::nil(),
            vec![item(1)],
            OrderType::Order,
            None,
        )
        .unwrap_err();
        assert_eq!(err.field(), "sales_staff_id");
    }

    #[test]
    fn zero_quantity_item_is_rejected_by_index() {
        let err = OrderRequest::build(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![item(1), item(0)],
            OrderType::Order,
            None,
        )
        .unwrap_err();
        assert_matches!(err, OrderValidationError::InvalidQuantity { index: 1 });
    }

    #[test]
    fn nil_product_is_rejected() {
        let mut bad = item(2);
        bad.product_id = Uuid::nil();
        let err = OrderRequest::build(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![bad],
            OrderType::Order,
            None,
        )
        .unwrap_err();
        assert_matches!(err, OrderValidationError::MissingProduct { index: 0 });
    }

    #[test]
    fn valid_request_builds_and_serializes() {
        let request = OrderRequest::build(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![item(2), item(1)],
            OrderType::Quotation,
            Some(Utc::now()),
        )
        .unwrap();

        let json = request.items_json().unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
    }
}
