use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{Cart, LineItem, PricingResult},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    #[validate(length(min = 1, message = "Variant code is required"))]
    pub variant_code: String,
    pub product_id: Uuid,
    pub unit_price: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub color_or_weight: String,
}

impl From<AddItemRequest> for LineItem {
    fn from(request: AddItemRequest) -> Self {
        Self {
            variant_code: request.variant_code,
            product_id: request.product_id,
            unit_price: request.unit_price,
            quantity: request.quantity,
            color_or_weight: request.color_or_weight,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddMultipleRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<AddItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TotalsQuery {
    #[serde(default)]
    pub discount_percent: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartEntry>,
    pub distinct_items: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartEntry {
    pub variant_code: String,
    pub product_id: Uuid,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub color_or_weight: String,
    pub line_total: Decimal,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let items: Vec<CartEntry> = cart
            .items()
            .iter()
            .map(|item| CartEntry {
                variant_code: item.variant_code.clone(),
                product_id: item.product_id,
                unit_price: item.unit_price,
                quantity: item.quantity,
                color_or_weight: item.color_or_weight.clone(),
                line_total: item.line_total(),
            })
            .collect();
        Self {
            distinct_items: items.len(),
            items,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/carts/{session_id}",
    summary = "Get cart",
    params(("session_id" = String, Path, description = "Cart session key")),
    responses(
        (status = 200, description = "Cart retrieved", body = ApiResponse<CartResponse>),
    )
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<CartResponse> {
    let cart = state.services.carts.get_cart(&session_id);
    Ok(Json(ApiResponse::success(cart.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/carts/{session_id}/items",
    summary = "Add cart item",
    description = "Add an item to the cart; duplicate variant codes merge quantities",
    params(("session_id" = String, Path, description = "Cart session key")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added", body = ApiResponse<CartResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<CartResponse> {
    request.validate()?;
    let cart = state
        .services
        .carts
        .add_item(&session_id, request.into())
        .await;
    Ok(Json(ApiResponse::success(cart.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/carts/{session_id}/items/batch",
    summary = "Add several cart items",
    description = "Add a batch of variants in one call; invalid entries are skipped",
    params(("session_id" = String, Path, description = "Cart session key")),
    request_body = AddMultipleRequest,
    responses(
        (status = 200, description = "Batch applied", body = ApiResponse<CartResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn add_multiple(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AddMultipleRequest>,
) -> ApiResult<CartResponse> {
    request.validate()?;
    let items = request.items.into_iter().map(Into::into).collect();
    let cart = state.services.carts.add_multiple(&session_id, items).await;
    Ok(Json(ApiResponse::success(cart.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/carts/{session_id}/items/{variant_code}",
    summary = "Set item quantity",
    params(
        ("session_id" = String, Path, description = "Cart session key"),
        ("variant_code" = String, Path, description = "Variant code"),
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<CartResponse>),
        (status = 404, description = "Variant not in cart", body = crate::errors::ErrorResponse),
    )
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((session_id, variant_code)): Path<(String, String)>,
    Json(request): Json<SetQuantityRequest>,
) -> ApiResult<CartResponse> {
    let cart = state
        .services
        .carts
        .set_quantity(&session_id, &variant_code, request.quantity)?;
    Ok(Json(ApiResponse::success(cart.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/carts/{session_id}/items/{variant_code}",
    summary = "Remove cart item",
    params(
        ("session_id" = String, Path, description = "Cart session key"),
        ("variant_code" = String, Path, description = "Variant code"),
    ),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<CartResponse>),
    )
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((session_id, variant_code)): Path<(String, String)>,
) -> ApiResult<CartResponse> {
    let cart = state.services.carts.remove_item(&session_id, &variant_code);
    Ok(Json(ApiResponse::success(cart.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/carts/{session_id}",
    summary = "Clear cart",
    params(("session_id" = String, Path, description = "Cart session key")),
    responses(
        (status = 200, description = "Cart cleared", body = ApiResponse<CartResponse>),
    )
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<CartResponse> {
    state.services.carts.clear(&session_id).await;
    Ok(Json(ApiResponse::success(Cart::default().into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/carts/{session_id}/totals",
    summary = "Cart totals",
    description = "Compute subtotal, discount and net total for the cart contents",
    params(
        ("session_id" = String, Path, description = "Cart session key"),
        ("discount_percent" = Option<Decimal>, Query, description = "Discount percentage (clamped to 0..=100)"),
    ),
    responses(
        (status = 200, description = "Totals computed", body = ApiResponse<PricingResult>),
    )
)]
pub async fn cart_totals(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<TotalsQuery>,
) -> ApiResult<PricingResult> {
    let totals = state
        .services
        .carts
        .totals(&session_id, query.discount_percent);
    Ok(Json(ApiResponse::success(totals)))
}
