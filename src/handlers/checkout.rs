use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::deserialize_decimal;
use crate::application::order_service::OrderService;
use crate::domain::checkout::CheckoutRequest;
use crate::domain::order::{Customer, OrderLine};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItemRequest {
    /// Product id in the store's catalogue.
    pub id: String,
    pub name: String,
    /// Unit price as a number or a decimal string, e.g. "29.99".
    #[serde(deserialize_with = "deserialize_decimal")]
    #[schema(value_type = f64)]
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerInfoRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub store_id: String,
    pub items: Vec<CheckoutItemRequest>,
    /// The cart total as computed by the storefront; checked, never trusted.
    #[serde(deserialize_with = "deserialize_decimal")]
    #[schema(value_type = f64)]
    pub total: BigDecimal,
    pub customer_info: CustomerInfoRequest,
}

impl From<CreateCheckoutRequest> for CheckoutRequest {
    fn from(body: CreateCheckoutRequest) -> Self {
        CheckoutRequest {
            store_id: body.store_id,
            items: body
                .items
                .into_iter()
                .map(|item| OrderLine {
                    product_id: item.id,
                    name: item.name,
                    unit_price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            declared_total: body.total,
            customer: Customer {
                name: body.customer_info.name,
                email: body.customer_info.email,
                phone: body.customer_info.phone,
                address: body.customer_info.address,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub success: bool,
    pub order_id: Uuid,
    pub payment_url: String,
    pub payment_id: String,
}

/// POST /api/checkout/create
///
/// Records a pending order for the cart and starts a payment for it. The
/// shopper is sent to `paymentUrl` to pay.
#[utoipa::path(
    post,
    path = "/api/checkout/create",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 200, description = "Order created and payment started", body = CreateCheckoutResponse),
        (status = 400, description = "Missing or invalid checkout data"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Payment could not be started"),
    ),
    tag = "checkout"
)]
pub async fn create_checkout(
    service: web::Data<OrderService>,
    body: web::Json<CreateCheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let placed = service.create_order(body.into_inner().into()).await?;

    Ok(HttpResponse::Ok().json(CreateCheckoutResponse {
        success: true,
        order_id: placed.order_id,
        payment_url: placed.payment_url,
        payment_id: placed.payment_id,
    }))
}
