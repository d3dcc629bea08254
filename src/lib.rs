pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let orders = Router::new()
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route(
            "/orders/:id/assign",
            post(handlers::orders::assign_resource_manager),
        )
        .route(
            "/orders/by-sales-rep/:sales_staff_id",
            get(handlers::orders::list_by_sales_rep),
        )
        .route(
            "/orders/by-resource-manager/:resource_manager_id",
            get(handlers::orders::list_by_resource_manager),
        );

    let carts = Router::new()
        .route(
            "/carts/:session_id",
            get(handlers::carts::get_cart).delete(handlers::carts::clear_cart),
        )
        .route("/carts/:session_id/items", post(handlers::carts::add_item))
        .route(
            "/carts/:session_id/items/batch",
            post(handlers::carts::add_multiple),
        )
        .route(
            "/carts/:session_id/items/:variant_code",
            put(handlers::carts::set_quantity).delete(handlers::carts::remove_item),
        )
        .route(
            "/carts/:session_id/totals",
            get(handlers::carts::cart_totals),
        );

    Router::new()
        .merge(orders)
        .merge(carts)
        .route("/status", get(api_status))
        .route("/health", get(health_check))
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Value> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "database": db_status,
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}
