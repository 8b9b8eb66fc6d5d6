use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, Order, OrderStatus, PaymentLink, PaymentStatus, PaymentUpdate, CURRENCY,
};
use crate::domain::ports::OrderRepository;

/// Process-local order store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    fn orders(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Order>>, DomainError> {
        self.orders
            .lock()
            .map_err(|_| DomainError::Storage("order map lock poisoned".to_string()))
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.orders()?.insert(
            id,
            Order {
                id,
                store_id: order.store_id,
                customer: order.customer,
                lines: order.lines,
                total: order.total,
                currency: CURRENCY.to_string(),
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::AwaitingPayment,
                payment_id: None,
                payment_url: None,
                payment_method: None,
                paid_at: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.orders()?.get(&id).cloned())
    }

    async fn attach_payment(&self, id: Uuid, link: PaymentLink) -> Result<(), DomainError> {
        let mut orders = self.orders()?;
        let order = orders.get_mut(&id).ok_or(DomainError::NotFound)?;
        if let Some(existing) = &order.payment_id {
            return Err(DomainError::Conflict(format!(
                "order {id} is already linked to payment {existing}"
            )));
        }
        order.payment_id = Some(link.payment_id);
        order.payment_url = Some(link.payment_url);
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn apply_payment_update(
        &self,
        id: Uuid,
        update: PaymentUpdate,
    ) -> Result<(), DomainError> {
        let mut orders = self.orders()?;
        let order = orders.get_mut(&id).ok_or(DomainError::NotFound)?;
        if let Some(status) = update.status {
            order.status = status;
        }
        order.payment_status = update.payment_status;
        if let Some(method) = update.payment_method {
            order.payment_method = Some(method);
        }
        order.paid_at = update.paid_at;
        if let Some(payment_id) = update.payment_id {
            order.payment_id = Some(payment_id);
        }
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), DomainError> {
        let mut orders = self.orders()?;
        let order = orders.get_mut(&id).ok_or(DomainError::NotFound)?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn list_for_store(
        &self,
        store_id: &str,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let orders = self.orders()?;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| o.store_id == store_id)
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let offset = (page - 1).saturating_mul(limit).max(0) as usize;
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit.max(0) as usize)
            .collect();
        Ok(ListResult { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Customer, OrderLine};

    fn new_order(store_id: &str) -> NewOrder {
        NewOrder {
            store_id: store_id.to_string(),
            customer: Customer {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
                phone: "555-0100".to_string(),
                address: "1 Navy Way".to_string(),
            },
            lines: vec![OrderLine {
                product_id: "p".to_string(),
                name: "Compiler".to_string(),
                unit_price: "9.99".parse().unwrap(),
                quantity: 1,
            }],
            total: "9.99".parse().unwrap(),
        }
    }

    fn link(payment_id: &str) -> PaymentLink {
        PaymentLink {
            payment_id: payment_id.to_string(),
            payment_url: format!("https://pay.example/{payment_id}"),
        }
    }

    #[tokio::test]
    async fn created_orders_start_pending_and_unlinked() {
        let repo = InMemoryOrderRepository::default();
        let id = repo.create(new_order("demo")).await.unwrap();

        let order = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::AwaitingPayment);
        assert_eq!(order.currency, "EUR");
        assert!(order.payment_id.is_none());
    }

    #[tokio::test]
    async fn payment_linkage_is_write_once() {
        let repo = InMemoryOrderRepository::default();
        let id = repo.create(new_order("demo")).await.unwrap();

        repo.attach_payment(id, link("tr_1")).await.unwrap();
        let err = repo.attach_payment(id, link("tr_2")).await.unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        let order = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(order.payment_id.as_deref(), Some("tr_1"));
    }

    #[tokio::test]
    async fn updates_to_unknown_orders_are_not_found() {
        let repo = InMemoryOrderRepository::default();
        let err = repo
            .update_status(Uuid::new_v4(), OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn listing_is_scoped_to_one_store_and_paginated() {
        let repo = InMemoryOrderRepository::default();
        for _ in 0..5 {
            repo.create(new_order("demo")).await.unwrap();
        }
        let other = repo.create(new_order("other")).await.unwrap();
        repo.update_status(other, OrderStatus::Cancelled).await.unwrap();

        let page1 = repo.list_for_store("demo", None, 1, 3).await.unwrap();
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);
        let page2 = repo.list_for_store("demo", None, 2, 3).await.unwrap();
        assert_eq!(page2.items.len(), 2);

        let cancelled = repo
            .list_for_store("demo", Some(OrderStatus::Cancelled), 1, 10)
            .await
            .unwrap();
        assert_eq!(cancelled.total, 0);
    }

    #[tokio::test]
    async fn page_far_beyond_the_end_is_empty() {
        let repo = InMemoryOrderRepository::default();
        repo.create(new_order("demo")).await.unwrap();

        let page = repo
            .list_for_store("demo", None, i64::MAX, 100)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
    }
}
