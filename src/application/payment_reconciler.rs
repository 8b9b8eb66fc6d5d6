use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderStatus, PaymentStatus};
use crate::domain::payment::plan_payment_update;
use crate::domain::ports::{OrderRepository, PaymentGateway};

/// An inbound webhook. Only the payment id is read; everything else the
/// provider sends is untrusted.
#[derive(Debug, Clone, Default)]
pub struct WebhookNotification {
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied {
        order_id: Uuid,
        status: OrderStatus,
        payment_status: PaymentStatus,
    },
    /// The gateway reported a status this service does not act on.
    Ignored { order_id: Uuid, gateway_status: String },
}

pub struct PaymentReconciler {
    repo: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    lookup_timeout: Duration,
}

impl PaymentReconciler {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            gateway,
            lookup_timeout,
        }
    }

    /// Re-read a payment from the gateway and bring its order in line with it.
    ///
    /// Safe to call any number of times for the same payment: every call
    /// writes values derived from the gateway's current record only.
    pub async fn reconcile(
        &self,
        notification: WebhookNotification,
    ) -> Result<ReconcileOutcome, DomainError> {
        let payment_id = validate_payment_id(notification.payment_id.as_deref())?;

        let payment = match tokio::time::timeout(
            self.lookup_timeout,
            self.gateway.get_payment(payment_id),
        )
        .await
        {
            Ok(Ok(payment)) => payment,
            Ok(Err(e)) => {
                log::warn!("Lookup of payment {} failed: {}", payment_id, e);
                return Err(DomainError::GatewayLookup(e.to_string()));
            }
            Err(_) => {
                log::warn!(
                    "Lookup of payment {} timed out after {:?}",
                    payment_id,
                    self.lookup_timeout
                );
                return Err(DomainError::GatewayLookup(format!(
                    "gateway did not respond within {:?}",
                    self.lookup_timeout
                )));
            }
        };

        let Some(order_id) = payment.order_id else {
            log::error!("Payment {} carries no order id in its metadata", payment_id);
            return Err(DomainError::orphan(payment_id, "no order id in payment metadata"));
        };

        let Some(order) = self.repo.find_by_id(order_id).await? else {
            log::error!(
                "Payment {} references order {} which does not exist",
                payment_id,
                order_id
            );
            return Err(DomainError::orphan(
                payment_id,
                format!("order {order_id} does not exist"),
            ));
        };

        if let Some(store_id) = payment.store_id.as_deref() {
            if store_id != order.store_id {
                log::error!(
                    "Payment {} was created for store {} but order {} belongs to store {}",
                    payment_id,
                    store_id,
                    order_id,
                    order.store_id
                );
                return Err(DomainError::orphan(
                    payment_id,
                    format!("order {order_id} belongs to another store"),
                ));
            }
        }

        match order.payment_id.as_deref() {
            Some(linked) if linked != payment_id => {
                log::error!(
                    "Order {} is linked to payment {}, not {}",
                    order_id,
                    linked,
                    payment_id
                );
                return Err(DomainError::orphan(
                    payment_id,
                    format!("order {order_id} is linked to another payment"),
                ));
            }
            None => log::error!(
                "Order {} has no payment linkage, restoring it from payment {}",
                order_id,
                payment_id
            ),
            Some(_) => {}
        }

        if payment.amount_differs_from(&order) {
            if let Some(amount) = &payment.amount {
                log::warn!(
                    "Payment {} is for {} {} but order {} totals {} {}",
                    payment_id,
                    amount.formatted_value(),
                    amount.currency,
                    order_id,
                    order.total,
                    order.currency
                );
            }
        }

        let Some(update) = plan_payment_update(&order, &payment, Utc::now()) else {
            log::warn!(
                "Ignoring unrecognised status '{}' of payment {} for order {}",
                payment.status.as_str(),
                payment_id,
                order_id
            );
            return Ok(ReconcileOutcome::Ignored {
                order_id,
                gateway_status: payment.status.as_str().to_string(),
            });
        };

        let status = update.status.unwrap_or(order.status);
        let payment_status = update.payment_status;
        self.repo.apply_payment_update(order_id, update).await?;
        log::info!(
            "Reconciled payment {} ({}): order {} is {} / {}",
            payment_id,
            payment.status.as_str(),
            order_id,
            status,
            payment_status
        );

        Ok(ReconcileOutcome::Applied {
            order_id,
            status,
            payment_status,
        })
    }
}

fn validate_payment_id(raw: Option<&str>) -> Result<&str, DomainError> {
    let id = raw.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(DomainError::validation("payment id is required"));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DomainError::validation(format!(
            "payment id '{id}' is malformed"
        )));
    }
    Ok(id)
}
