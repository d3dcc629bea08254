use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{order, order_item},
    errors::ServiceError,
    models::{OrderStatus, OrderType, TransitionContext},
    repositories::{CreatedOrder, OrderWithItems},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub sales_staff_id: Uuid,
    pub order_type: OrderType,
    pub delivery_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    #[validate(length(min = 1, message = "Variant code is required"))]
    pub variant_code: String,
    pub product_id: Uuid,
    pub unit_price: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub color_or_weight: String,
}

impl From<OrderItemInput> for crate::models::LineItem {
    fn from(input: OrderItemInput) -> Self {
        Self {
            variant_code: input.variant_code,
            product_id: input.product_id,
            unit_price: input.unit_price,
            quantity: input.quantity,
            color_or_weight: input.color_or_weight,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub payment_term: Option<String>,
    pub billing_company: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequest {
    pub resource_manager_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub variant_code: String,
    pub color_or_weight: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub sales_staff_id: Uuid,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub delivery_date: Option<DateTime<Utc>>,
    pub payment_term: Option<String>,
    pub billing_company: Option<String>,
    pub assigned_resource_manager: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItemResponse>,
}

fn map_item(item: &order_item::Model) -> OrderItemResponse {
    OrderItemResponse {
        product_id: item.product_id,
        variant_code: item.variant_code.clone(),
        color_or_weight: item.color_or_weight.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        line_total: item.line_total,
    }
}

fn map_order(order: &order::Model, items: &[order_item::Model]) -> OrderResponse {
    OrderResponse {
        id: order.id,
        customer_id: order.customer_id,
        sales_staff_id: order.sales_staff_id,
        order_type: order.order_type,
        status: order.status,
        total_amount: order.total_amount,
        delivery_date: order.delivery_date,
        payment_term: order.payment_term.clone(),
        billing_company: order.billing_company.clone(),
        assigned_resource_manager: order.assigned_resource_manager,
        created_at: order.created_at,
        updated_at: order.updated_at,
        version: order.version,
        items: items.iter().map(map_item).collect(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Create a new order or quotation from validated line items",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<CreatedOrder>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedOrder>>), ServiceError> {
    request.validate()?;
    for item in &request.items {
        item.validate()?;
    }

    let items = request.items.into_iter().map(Into::into).collect();
    let created = state
        .services
        .orders
        .create_order(
            request.customer_id,
            request.sales_staff_id,
            items,
            request.order_type,
            request.delivery_date,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderResponse> {
    let OrderWithItems { order, items } = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(map_order(&order, &items))))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    summary = "Update order status",
    description = "Move an order through its lifecycle; invalid transitions are rejected",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Missing transition context", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<OrderResponse> {
    let ctx = TransitionContext {
        payment_term: request.payment_term,
        billing_company: request.billing_company,
    };
    let updated = state
        .services
        .orders
        .update_status(id, request.status, ctx)
        .await?;
    Ok(Json(ApiResponse::success(map_order(&updated, &[]))))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/assign",
    summary = "Assign resource manager",
    description = "Claim an order for fulfillment; re-claiming by another manager is rejected",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Order assigned", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already assigned", body = crate::errors::ErrorResponse),
    )
)]
pub async fn assign_resource_manager(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<OrderResponse> {
    let updated = state
        .services
        .orders
        .assign_resource_manager(id, request.resource_manager_id)
        .await?;
    Ok(Json(ApiResponse::success(map_order(&updated, &[]))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/by-sales-rep/{sales_staff_id}",
    summary = "List orders by sales rep",
    params(("sales_staff_id" = Uuid, Path, description = "Sales staff ID")),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<OrderResponse>>),
    )
)]
pub async fn list_by_sales_rep(
    State(state): State<AppState>,
    Path(sales_staff_id): Path<Uuid>,
) -> ApiResult<Vec<OrderResponse>> {
    let orders = state
        .services
        .orders
        .list_by_sales_rep(sales_staff_id)
        .await?;
    let mapped = orders.iter().map(|o| map_order(o, &[])).collect();
    Ok(Json(ApiResponse::success(mapped)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/by-resource-manager/{resource_manager_id}",
    summary = "List orders by resource manager",
    params(("resource_manager_id" = Uuid, Path, description = "Resource manager ID")),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<OrderResponse>>),
    )
)]
pub async fn list_by_resource_manager(
    State(state): State<AppState>,
    Path(resource_manager_id): Path<Uuid>,
) -> ApiResult<Vec<OrderResponse>> {
    let orders = state
        .services
        .orders
        .list_by_resource_manager(resource_manager_id)
        .await?;
    let mapped = orders.iter().map(|o| map_order(o, &[])).collect();
    Ok(Json(ApiResponse::success(mapped)))
}
