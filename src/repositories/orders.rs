use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    ModelTrait, QueryFilter, QueryOrder, Statement,
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{order, order_item},
    errors::{codes, ServiceError},
    models::{OrderRequest, OrderStatus, TransitionContext},
};

/// Successful outcome of an atomic order creation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedOrder {
    pub order_id: Uuid,
    pub total: Decimal,
}

#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// The persistence boundary for orders.
///
/// Mutations are atomic on the far side of this trait; callers validate
/// before calling and never rely on the boundary to discover bad input. A
/// reported business failure surfaces as `ServiceError::UpstreamError` with
/// the upstream message verbatim.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, ServiceError>;

    /// Applies an already-validated status change. `expected_version` guards
    /// against lost updates: a concurrent writer bumps the version and this
    /// call reports a conflict instead of silently overwriting.
    async fn update_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        ctx: &TransitionContext,
        expected_version: i32,
    ) -> Result<order::Model, ServiceError>;

    /// Records the resource-manager assignment, guarded so only an
    /// unassigned order can be claimed.
    async fn assign_resource_manager(
        &self,
        order_id: Uuid,
        resource_manager_id: Uuid,
    ) -> Result<order::Model, ServiceError>;

    async fn find_order(&self, order_id: Uuid) -> Result<Option<OrderWithItems>, ServiceError>;

    async fn list_by_sales_rep(&self, sales_staff_id: Uuid)
        -> Result<Vec<order::Model>, ServiceError>;

    async fn list_by_resource_manager(
        &self,
        resource_manager_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError>;
}

/// Row shape returned by the order-creation procedure.
#[derive(Debug, FromQueryResult)]
struct CreateOrderRow {
    p_success: bool,
    p_message: String,
    p_order_id: Option<Uuid>,
    p_total: Option<Decimal>,
}

impl CreateOrderRow {
    /// Converts the OUT-parameter row into a discriminated result right at
    /// the call site, so downstream code never inspects ad hoc flags.
    fn into_result(self) -> Result<CreatedOrder, ServiceError> {
        if !self.p_success {
            return Err(ServiceError::UpstreamError(self.p_message));
        }
        match (self.p_order_id, self.p_total) {
            (Some(order_id), Some(total)) => Ok(CreatedOrder { order_id, total }),
            _ => Err(ServiceError::InternalError(
                "order procedure reported success without an order id".into(),
            )),
        }
    }
}

/// Database-backed repository: order creation goes through the stored
/// procedure that owns atomicity, everything else uses the ORM.
#[derive(Clone)]
pub struct SqlOrderRepository {
    db: Arc<DatabaseConnection>,
}

impl SqlOrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for SqlOrderRepository {
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, ServiceError> {
        let items_json = request.items_json()?;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT p_success, p_message, p_order_id, p_total \
             FROM sp_create_order($1, $2, $3::jsonb, $4, $5)",
            [
                request.customer_id.into(),
                request.sales_staff_id.into(),
                items_json.into(),
                request.order_type.to_string().into(),
                request.delivery_date.into(),
            ],
        );

        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(|e| {
                error!(error = %e, "Order creation procedure failed");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::InternalError("order procedure returned no result row".into())
            })?;

        let outcome = CreateOrderRow::from_query_result(&row, "")
            .map_err(ServiceError::DatabaseError)?
            .into_result()?;

        info!(order_id = %outcome.order_id, total = %outcome.total, "Order created");
        Ok(outcome)
    }

    #[instrument(skip(self, ctx), fields(order_id = %order_id, target = %target))]
    async fn update_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        ctx: &TransitionContext,
        expected_version: i32,
    ) -> Result<order::Model, ServiceError> {
        let update = order::ActiveModel {
            id: NotSet,
            status: Set(target),
            payment_term: match &ctx.payment_term {
                Some(term) => Set(Some(term.clone())),
                None => NotSet,
            },
            billing_company: match &ctx.billing_company {
                Some(company) => Set(Some(company.clone())),
                None => NotSet,
            },
            updated_at: Set(Some(Utc::now())),
            version: Set(expected_version + 1),
            ..Default::default()
        };

        let result = order::Entity::update_many()
            .set(update)
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Version.eq(expected_version))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            // Either the order is gone or another writer got there first.
            return match order::Entity::find_by_id(order_id).one(&*self.db).await? {
                None => Err(ServiceError::NotFound(format!(
                    "Order {} not found",
                    order_id
                ))),
                Some(current) => {
                    warn!(
                        order_id = %order_id,
                        expected_version,
                        current_version = current.version,
                        "Status update lost a concurrent write"
                    );
                    Err(ServiceError::conflict_with_code(
                        "Order was modified concurrently; refresh and retry",
                        codes::VERSION_CONFLICT,
                    ))
                }
            };
        }

        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    #[instrument(skip(self), fields(order_id = %order_id, resource_manager_id = %resource_manager_id))]
    async fn assign_resource_manager(
        &self,
        order_id: Uuid,
        resource_manager_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let update = order::ActiveModel {
            assigned_resource_manager: Set(Some(resource_manager_id)),
            assigned_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };

        let result = order::Entity::update_many()
            .set(update)
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::AssignedResourceManager.is_null())
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            // Either the order is gone or it already has a manager.
            return match order::Entity::find_by_id(order_id).one(&*self.db).await? {
                None => Err(ServiceError::NotFound(format!(
                    "Order {} not found",
                    order_id
                ))),
                Some(_) => Err(ServiceError::conflict_with_code(
                    "Order is already assigned to a resource manager",
                    codes::ORDER_ALREADY_ASSIGNED,
                )),
            };
        }

        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn find_order(&self, order_id: Uuid) -> Result<Option<OrderWithItems>, ServiceError> {
        let Some(order) = order::Entity::find_by_id(order_id).one(&*self.db).await? else {
            return Ok(None);
        };
        let items = order
            .find_related(order_item::Entity)
            .all(&*self.db)
            .await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn list_by_sales_rep(
        &self,
        sales_staff_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::SalesStaffId.eq(sales_staff_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn list_by_resource_manager(
        &self,
        resource_manager_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::AssignedResourceManager.eq(resource_manager_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
