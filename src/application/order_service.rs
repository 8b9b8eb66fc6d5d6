use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::checkout::CheckoutRequest;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrder, Order, OrderStatus, PaymentLink, PaymentStatus};
use crate::domain::payment::{Money, PaymentMetadata, PaymentRequest};
use crate::domain::ports::{OrderRepository, PaymentGateway};

/// Where the gateway sends the shopper and its notifications, and what it may offer.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub public_base_url: String,
    pub payment_methods: Vec<String>,
    pub gateway_timeout: Duration,
}

impl CheckoutSettings {
    fn base(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }

    pub fn redirect_url(&self, store_id: &str, order_id: Uuid) -> String {
        format!(
            "{}/store/{}/payment/success?orderId={}",
            self.base(),
            store_id,
            order_id
        )
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/api/webhook/mollie", self.base())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub payment_id: String,
    pub payment_url: String,
}

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            repo,
            gateway,
            settings,
        }
    }

    /// Persist a pending order, then ask the gateway for a payment.
    ///
    /// The order is written before the gateway is contacted and is kept when
    /// the gateway fails, so an order without a payment id is the visible
    /// trace of a failed initiation.
    pub async fn create_order(&self, request: CheckoutRequest) -> Result<PlacedOrder, DomainError> {
        let order = NewOrder::from_checkout(request)?;
        let store_id = order.store_id.clone();
        let customer_email = order.customer.email.clone();
        let amount = Money::eur(order.total.clone());

        let order_id = self.repo.create(order).await?;
        log::info!(
            "Created order {} for store {} ({} {})",
            order_id,
            store_id,
            amount.formatted_value(),
            amount.currency
        );

        let payment_request = PaymentRequest {
            amount,
            description: format!("Order {} from store {}", order_id, store_id),
            redirect_url: self.settings.redirect_url(&store_id, order_id),
            webhook_url: self.settings.webhook_url(),
            metadata: PaymentMetadata {
                order_id,
                store_id,
                customer_email,
            },
            methods: self.settings.payment_methods.clone(),
        };

        let created = match tokio::time::timeout(
            self.settings.gateway_timeout,
            self.gateway.create_payment(payment_request),
        )
        .await
        {
            Ok(Ok(created)) => created,
            Ok(Err(e)) => {
                log::warn!("Payment creation for order {} failed: {}", order_id, e);
                return Err(DomainError::PaymentInitiation(e.to_string()));
            }
            Err(_) => {
                log::warn!(
                    "Payment creation for order {} timed out after {:?}",
                    order_id,
                    self.settings.gateway_timeout
                );
                return Err(DomainError::PaymentInitiation(format!(
                    "gateway did not respond within {:?}",
                    self.settings.gateway_timeout
                )));
            }
        };

        self.repo
            .attach_payment(
                order_id,
                PaymentLink {
                    payment_id: created.id.clone(),
                    payment_url: created.checkout_url.clone(),
                },
            )
            .await
            .map_err(|e| {
                log::error!(
                    "Payment {} was created but could not be linked to order {}: {}",
                    created.id,
                    order_id,
                    e
                );
                // Freshly created order: a refusal here is a store fault.
                match e {
                    DomainError::Conflict(msg) => DomainError::Storage(msg),
                    DomainError::NotFound => DomainError::Storage(format!(
                        "order {order_id} disappeared before its payment was linked"
                    )),
                    other => other,
                }
            })?;

        Ok(PlacedOrder {
            order_id,
            payment_id: created.id,
            payment_url: created.checkout_url,
        })
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.repo.find_by_id(id).await
    }

    pub async fn list_orders(
        &self,
        store_id: &str,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.repo.list_for_store(store_id, status, page, limit).await
    }

    /// Move a paid order through processing, shipped and delivered.
    pub async fn update_fulfillment_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        if !status.is_fulfillment() {
            return Err(DomainError::validation(format!(
                "status '{status}' is set by payment processing, not by operators"
            )));
        }
        let order = self.repo.find_by_id(id).await?.ok_or(DomainError::NotFound)?;
        if order.payment_status != PaymentStatus::Paid {
            return Err(DomainError::validation(format!(
                "order {id} has payment status '{}' and cannot be fulfilled",
                order.payment_status
            )));
        }

        self.repo.update_status(id, status).await?;
        log::info!("Order {} moved from {} to {}", id, order.status, status);
        self.repo.find_by_id(id).await?.ok_or(DomainError::NotFound)
    }
}
