use async_trait::async_trait;
use uuid::Uuid;

use super::errors::{DomainError, GatewayError};
use super::order::{ListResult, NewOrder, Order, OrderStatus, PaymentLink, PaymentUpdate};
use super::payment::{CreatedPayment, GatewayPayment, PaymentRequest};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persist a new order in `pending`/`awaiting_payment` and return its id.
    async fn create(&self, order: NewOrder) -> Result<Uuid, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Record the gateway linkage. Fails with `Conflict` if one is already set.
    async fn attach_payment(&self, id: Uuid, link: PaymentLink) -> Result<(), DomainError>;
    async fn apply_payment_update(&self, id: Uuid, update: PaymentUpdate)
        -> Result<(), DomainError>;
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), DomainError>;
    async fn list_for_store(
        &self,
        store_id: &str,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_payment(&self, request: PaymentRequest)
        -> Result<CreatedPayment, GatewayError>;
    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}
