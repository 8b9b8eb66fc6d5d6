use actix_web::{web, Either, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::payment_reconciler::{PaymentReconciler, WebhookNotification};
use crate::errors::AppError;

/// Mollie posts `id=tr_...` form-encoded; JSON is accepted as well. Any other
/// field is ignored, the payment is always re-read from the gateway.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct WebhookPayload {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    pub received: bool,
}

/// POST /api/webhook/mollie
///
/// Answers 200 only once the order reflects the payment's current state, so
/// Mollie retries deliveries that could not be processed.
#[utoipa::path(
    post,
    path = "/api/webhook/mollie",
    request_body(
        content = WebhookPayload,
        content_type = "application/x-www-form-urlencoded",
        description = "Payment id as sent by Mollie; application/json is accepted too"
    ),
    responses(
        (status = 200, description = "Notification processed", body = WebhookResponse),
        (status = 400, description = "Missing payment id or payment without an order"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Payment lookup or store failure, retry later"),
    ),
    tag = "webhook"
)]
pub async fn mollie_webhook(
    reconciler: web::Data<PaymentReconciler>,
    body: Either<web::Json<WebhookPayload>, web::Form<WebhookPayload>>,
) -> Result<HttpResponse, AppError> {
    let payload = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    reconciler
        .reconcile(WebhookNotification {
            payment_id: payload.id,
        })
        .await?;

    Ok(HttpResponse::Ok().json(WebhookResponse { received: true }))
}
