use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    entities::order,
    errors::{codes, ServiceError},
    events::{Event, EventSender},
    models::{LineItem, OrderRequest, OrderStatus, OrderType, TransitionContext},
    repositories::{CreatedOrder, OrderRepository, OrderWithItems},
};

use super::inventory::InventoryClient;

/// Order/quotation workflow: creation through the persistence boundary,
/// status transitions through the state machine, and fulfillment assignment.
#[derive(Clone)]
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryClient>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryClient>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            repository,
            inventory,
            event_sender,
        }
    }

    /// Validates and submits a creation request. Validation failures are
    /// returned before the repository is touched.
    #[instrument(skip(self, items), fields(customer_id = %customer_id, order_type = %order_type))]
    pub async fn create_order(
        &self,
        customer_id: Uuid,
        sales_staff_id: Uuid,
        items: Vec<LineItem>,
        order_type: OrderType,
        delivery_date: Option<DateTime<Utc>>,
    ) -> Result<CreatedOrder, ServiceError> {
        let request =
            OrderRequest::build(customer_id, sales_staff_id, items, order_type, delivery_date)?;

        let created = self.repository.create_order(&request).await?;

        info!(order_id = %created.order_id, total = %created.total, "Order created");
        self.event_sender
            .send_or_log(Event::OrderCreated(created.order_id))
            .await;

        Ok(created)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        self.repository
            .find_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    pub async fn list_by_sales_rep(
        &self,
        sales_staff_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        self.repository.list_by_sales_rep(sales_staff_id).await
    }

    pub async fn list_by_resource_manager(
        &self,
        resource_manager_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        self.repository
            .list_by_resource_manager(resource_manager_id)
            .await
    }

    /// Moves an order to `target` if the state machine allows it from the
    /// order's current status. The persisted write is version-guarded, so a
    /// concurrent transition surfaces as a conflict rather than a lost
    /// update.
    #[instrument(skip(self, ctx), fields(order_id = %order_id, target = %target))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        ctx: TransitionContext,
    ) -> Result<order::Model, ServiceError> {
        let OrderWithItems { order, items } = self.get_order(order_id).await?;
        let old_status = order.status;

        old_status.validate_transition(target, &ctx)?;

        let updated = self
            .repository
            .update_order_status(order_id, target, &ctx, order.version)
            .await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: target,
            })
            .await;

        if target == OrderStatus::GenerateInvoice {
            self.decrement_reserved_quantities(order_id, &items).await;
            self.event_sender
                .send_or_log(Event::InvoiceGenerated(order_id))
                .await;
        }

        Ok(updated)
    }

    /// Fire-and-forget relative to the committed status change: a failed
    /// decrement is logged and does not roll the transition back.
    async fn decrement_reserved_quantities(
        &self,
        order_id: Uuid,
        items: &[crate::entities::order_item::Model],
    ) {
        for item in items {
            if let Err(e) = self
                .inventory
                .decrement_reserved(item.product_id, item.quantity)
                .await
            {
                error!(
                    %order_id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "Reserved-quantity decrement failed after invoice generation"
                );
            }
        }
    }

    /// Assigns the order to a resource manager. Re-assigning the same
    /// manager is an idempotent no-op; a different manager is a conflict,
    /// never a silent overwrite.
    #[instrument(skip(self), fields(order_id = %order_id, resource_manager_id = %resource_manager_id))]
    pub async fn assign_resource_manager(
        &self,
        order_id: Uuid,
        resource_manager_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let OrderWithItems { order, .. } = self.get_order(order_id).await?;

        match order.assigned_resource_manager {
            Some(current) if current == resource_manager_id => {
                info!("Order already assigned to this resource manager; no-op");
                return Ok(order);
            }
            Some(_) => {
                return Err(ServiceError::conflict_with_code(
                    "Order is already assigned to another resource manager",
                    codes::ORDER_ALREADY_ASSIGNED,
                ));
            }
            None => {}
        }

        let updated = self
            .repository
            .assign_resource_manager(order_id, resource_manager_id)
            .await?;

        self.event_sender
            .send_or_log(Event::OrderAssigned {
                order_id,
                resource_manager_id,
            })
            .await;

        Ok(updated)
    }
}
