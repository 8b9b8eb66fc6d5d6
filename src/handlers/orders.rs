use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::errors::AppError;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub product_id: String,
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub store_id: String,
    pub customer: CustomerResponse,
    pub items: Vec<OrderLineResponse>,
    pub total: String,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub mollie_payment_id: Option<String>,
    pub payment_url: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            store_id: order.store_id,
            customer: CustomerResponse {
                name: order.customer.name,
                email: order.customer.email,
                phone: order.customer.phone,
                address: order.customer.address,
            },
            items: order.lines.into_iter().map(line_response).collect(),
            total: order.total.to_string(),
            currency: order.currency,
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            mollie_payment_id: order.payment_id,
            payment_url: order.payment_url,
            payment_method: order.payment_method,
            paid_at: order.paid_at.map(|t| t.to_rfc3339()),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

fn line_response(line: OrderLine) -> OrderLineResponse {
    OrderLineResponse {
        product_id: line.product_id,
        name: line.name,
        unit_price: line.unit_price.to_string(),
        quantity: line.quantity,
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Only return orders in this status, e.g. "confirmed".
    pub status: Option<String>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of "processing", "shipped" or "delivered".
    pub status: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/orders/{id}
///
/// Returns the order together with its line items.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    match service.get_order(path.into_inner()).await? {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /api/stores/{store_id}/orders
///
/// Returns a page of a store's orders, newest first.
/// Use `page` (1-based) and `limit` to control pagination.
#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/orders",
    params(
        ("store_id" = String, Path, description = "Store identifier"),
        ListOrdersParams,
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_store_orders(
    service: web::Data<OrderService>,
    path: web::Path<String>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let store_id = path.into_inner();
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<OrderStatus>())
        .transpose()?;

    let result = service.list_orders(&store_id, status, page, limit).await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PATCH /api/orders/{id}/status
///
/// Moves a paid order along fulfillment. Payment-driven statuses cannot be
/// set here.
#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Status not allowed for this order"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let status: OrderStatus = body.status.trim().parse()?;
    let order = service
        .update_fulfillment_status(path.into_inner(), status)
        .await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
