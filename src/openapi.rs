use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OrderFlow API",
        version = "0.1.0",
        description = r#"
# OrderFlow Order Management API

Order and quotation workflow for a multi-role sales organization: carts,
discount pricing, order creation through a stored-procedure boundary, a
status lifecycle from approval to paid invoice, and fulfillment assignment.

## Error Handling

Failed requests use a consistent envelope with appropriate HTTP status codes:

```json
{
  "success": false,
  "error": "Conflict",
  "message": "Cannot move order from pending to paid_invoice",
  "error_code": "INVALID_TRANSITION",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#,
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Order and quotation lifecycle endpoints"),
        (name = "Carts", description = "Session cart endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::assign_resource_manager,
        crate::handlers::orders::list_by_sales_rep,
        crate::handlers::orders::list_by_resource_manager,

        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_item,
        crate::handlers::carts::add_multiple,
        crate::handlers::carts::set_quantity,
        crate::handlers::carts::remove_item,
        crate::handlers::carts::clear_cart,
        crate::handlers::carts::cart_totals,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,

            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::OrderItemInput,
            crate::handlers::orders::UpdateStatusRequest,
            crate::handlers::orders::AssignRequest,
            crate::handlers::orders::OrderResponse,
            crate::handlers::orders::OrderItemResponse,
            crate::repositories::CreatedOrder,
            crate::models::OrderStatus,
            crate::models::OrderType,

            crate::handlers::carts::AddItemRequest,
            crate::handlers::carts::AddMultipleRequest,
            crate::handlers::carts::SetQuantityRequest,
            crate::handlers::carts::CartResponse,
            crate::handlers::carts::CartEntry,
            crate::models::PricingResult,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
