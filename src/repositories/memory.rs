use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    entities::{order, order_item},
    errors::{codes, ServiceError},
    models::{LineItem, OrderRequest, OrderStatus, TransitionContext},
};

use super::orders::{CreatedOrder, OrderRepository, OrderWithItems};

/// In-process stand-in for the stored-procedure boundary. Mirrors the SQL
/// repository's guarantees (atomic creation, version check on status
/// updates, single assignment) without a database.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: DashMap<Uuid, OrderWithItems>,
    fail_create_with: Mutex<Option<String>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `create_order` fail the way the procedure does when it
    /// reports a business error: `success = false` plus a message.
    pub fn fail_next_create(&self, message: impl Into<String>) {
        *self.fail_create_with.lock().unwrap() = Some(message.into());
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn snapshot_items(order_id: Uuid, items: &[LineItem]) -> Vec<order_item::Model> {
        items
            .iter()
            .map(|item| order_item::Model {
                id: Uuid::new_v4(),
                order_id,
                product_id: item.product_id,
                variant_code: item.variant_code.clone(),
                color_or_weight: item.color_or_weight.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total(),
                created_at: Utc::now(),
            })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, ServiceError> {
        if let Some(message) = self.fail_create_with.lock().unwrap().take() {
            return Err(ServiceError::UpstreamError(message));
        }

        let order_id = Uuid::new_v4();
        let items = Self::snapshot_items(order_id, &request.items);
        let total: Decimal = items.iter().map(|i| i.line_total).sum();
        let now = Utc::now();

        let model = order::Model {
            id: order_id,
            customer_id: request.customer_id,
            sales_staff_id: request.sales_staff_id,
            order_type: request.order_type,
            status: OrderStatus::Pending,
            total_amount: total,
            delivery_date: request.delivery_date,
            payment_term: None,
            billing_company: None,
            assigned_resource_manager: None,
            assigned_at: None,
            created_at: now,
            updated_at: Some(now),
            version: 1,
        };

        self.orders.insert(
            order_id,
            OrderWithItems {
                order: model,
                items,
            },
        );

        Ok(CreatedOrder { order_id, total })
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        ctx: &TransitionContext,
        expected_version: i32,
    ) -> Result<order::Model, ServiceError> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if entry.order.version != expected_version {
            return Err(ServiceError::conflict_with_code(
                "Order was modified concurrently; refresh and retry",
                codes::VERSION_CONFLICT,
            ));
        }

        entry.order.status = target;
        if let Some(term) = &ctx.payment_term {
            entry.order.payment_term = Some(term.clone());
        }
        if let Some(company) = &ctx.billing_company {
            entry.order.billing_company = Some(company.clone());
        }
        entry.order.updated_at = Some(Utc::now());
        entry.order.version += 1;

        Ok(entry.order.clone())
    }

    async fn assign_resource_manager(
        &self,
        order_id: Uuid,
        resource_manager_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if entry.order.assigned_resource_manager.is_some() {
            return Err(ServiceError::conflict_with_code(
                "Order is already assigned to a resource manager",
                codes::ORDER_ALREADY_ASSIGNED,
            ));
        }

        entry.order.assigned_resource_manager = Some(resource_manager_id);
        entry.order.assigned_at = Some(Utc::now());
        entry.order.updated_at = Some(Utc::now());

        Ok(entry.order.clone())
    }

    async fn find_order(&self, order_id: Uuid) -> Result<Option<OrderWithItems>, ServiceError> {
        Ok(self.orders.get(&order_id).map(|entry| entry.value().clone()))
    }

    async fn list_by_sales_rep(
        &self,
        sales_staff_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let mut orders: Vec<order::Model> = self
            .orders
            .iter()
            .filter(|entry| entry.order.sales_staff_id == sales_staff_id)
            .map(|entry| entry.order.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_by_resource_manager(
        &self,
        resource_manager_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let mut orders: Vec<order::Model> = self
            .orders
            .iter()
            .filter(|entry| entry.order.assigned_resource_manager == Some(resource_manager_id))
            .map(|entry| entry.order.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
