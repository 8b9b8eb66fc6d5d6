//! Mollie Payments API v2 client.
//!
//! Only the two calls the checkout flow needs are implemented: creating a
//! payment and fetching one by id. The metadata written on creation is read
//! back on lookup to find the order a payment belongs to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::MollieConfig;
use crate::domain::errors::GatewayError;
use crate::domain::payment::{
    CreatedPayment, GatewayPayment, GatewayPaymentStatus, Money, PaymentRequest,
};
use crate::domain::ports::PaymentGateway;

#[derive(Debug, Serialize, Deserialize)]
struct MollieAmount {
    currency: String,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentBody<'a> {
    amount: MollieAmount,
    description: &'a str,
    redirect_url: &'a str,
    webhook_url: &'a str,
    metadata: Value,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    method: &'a [String],
}

#[derive(Debug, Deserialize)]
struct MollieLink {
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct MollieLinks {
    checkout: Option<MollieLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MolliePayment {
    id: String,
    status: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    amount: Option<MollieAmount>,
    #[serde(default)]
    metadata: Value,
    #[serde(rename = "_links", default)]
    links: MollieLinks,
}

impl MolliePayment {
    fn into_domain(self) -> Result<GatewayPayment, GatewayError> {
        let amount = self
            .amount
            .map(|a| {
                a.value
                    .parse()
                    .map(|value| Money {
                        currency: a.currency,
                        value,
                    })
                    .map_err(|e| GatewayError::Decode(format!("invalid amount '{}': {}", a.value, e)))
            })
            .transpose()?;

        // Unreadable metadata is reported as absent; the caller decides what that means.
        let order_id = self
            .metadata
            .get("orderId")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());
        let store_id = self
            .metadata
            .get("storeId")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(GatewayPayment {
            id: self.id,
            status: GatewayPaymentStatus::parse(&self.status),
            method: self.method,
            paid_at: self.paid_at,
            amount,
            order_id,
            store_id,
        })
    }
}

#[derive(Clone)]
pub struct MollieGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl MollieGateway {
    pub fn new(config: &MollieConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl PaymentGateway for MollieGateway {
    async fn create_payment(&self, request: PaymentRequest) -> Result<CreatedPayment, GatewayError> {
        let body = CreatePaymentBody {
            amount: MollieAmount {
                currency: request.amount.currency.clone(),
                value: request.amount.formatted_value(),
            },
            description: &request.description,
            redirect_url: &request.redirect_url,
            webhook_url: &request.webhook_url,
            metadata: json!({
                "orderId": request.metadata.order_id,
                "storeId": request.metadata.store_id,
                "customerEmail": request.metadata.customer_email,
            }),
            method: &request.methods,
        };

        let response = self
            .client
            .post(format!("{}/payments", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let payment: MolliePayment = read_json(response).await?;

        let checkout_url = payment
            .links
            .checkout
            .map(|link| link.href)
            .ok_or_else(|| {
                GatewayError::Decode(format!("payment {} has no checkout link", payment.id))
            })?;
        log::debug!("Mollie payment {} created", payment.id);

        Ok(CreatedPayment {
            id: payment.id,
            checkout_url,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let response = self
            .client
            .get(format!("{}/payments/{}", self.api_url, payment_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(payment_id.to_string()));
        }

        read_json::<MolliePayment>(response).await?.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_metadata_is_read_back() {
        let order_id = Uuid::new_v4();
        let payment: MolliePayment = serde_json::from_value(json!({
            "resource": "payment",
            "id": "tr_WDqYK6vllg",
            "status": "paid",
            "method": "creditcard",
            "paidAt": "2024-01-01T00:00:00+00:00",
            "amount": { "currency": "EUR", "value": "50.00" },
            "metadata": { "orderId": order_id.to_string(), "storeId": "demo" },
            "_links": { "self": { "href": "https://api.mollie.com/v2/payments/tr_WDqYK6vllg" } }
        }))
        .unwrap();

        let payment = payment.into_domain().unwrap();
        assert_eq!(payment.status, GatewayPaymentStatus::Paid);
        assert_eq!(payment.order_id, Some(order_id));
        assert_eq!(payment.store_id.as_deref(), Some("demo"));
        assert_eq!(payment.paid_at.map(|t| t.to_rfc3339()).as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(payment.amount.unwrap().formatted_value(), "50.00");
    }

    #[test]
    fn missing_or_foreign_metadata_yields_no_order() {
        for metadata in [json!(null), json!({}), json!({ "orderId": "12345" })] {
            let payment: MolliePayment = serde_json::from_value(json!({
                "id": "tr_1",
                "status": "open",
                "metadata": metadata,
            }))
            .unwrap();
            assert_eq!(payment.into_domain().unwrap().order_id, None);
        }
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let payment: MolliePayment =
            serde_json::from_value(json!({ "id": "tr_1", "status": "settling" })).unwrap();
        assert_eq!(
            payment.into_domain().unwrap().status,
            GatewayPaymentStatus::Other("settling".to_string())
        );
    }

    #[test]
    fn malformed_amount_is_a_decode_error() {
        let payment: MolliePayment = serde_json::from_value(json!({
            "id": "tr_1",
            "status": "paid",
            "amount": { "currency": "EUR", "value": "fifty" }
        }))
        .unwrap();
        assert!(matches!(payment.into_domain(), Err(GatewayError::Decode(_))));
    }
}
