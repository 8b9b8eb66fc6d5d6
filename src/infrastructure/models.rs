use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Customer, Order, OrderLine, PaymentUpdate};
use crate::schema::{order_lines, orders};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub store_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub total: BigDecimal,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub payment_id: Option<String>,
    pub payment_url: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub store_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub total: BigDecimal,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: String,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: String,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
}

/// Columns touched by reconciliation. `None` leaves a column as it is, except
/// for `paid_at` whose inner `None` clears it.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct PaymentChangeset {
    pub status: Option<String>,
    pub payment_status: String,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentChangeset {
    pub fn new(update: PaymentUpdate, now: DateTime<Utc>) -> Self {
        Self {
            status: update.status.map(|s| s.as_str().to_string()),
            payment_status: update.payment_status.as_str().to_string(),
            payment_id: update.payment_id,
            payment_method: update.payment_method,
            paid_at: Some(update.paid_at),
            updated_at: now,
        }
    }
}

impl OrderRow {
    pub fn into_domain(self, lines: Vec<OrderLineRow>) -> Result<Order, DomainError> {
        let mut lines = lines;
        lines.sort_by_key(|l| l.position);

        Ok(Order {
            id: self.id,
            status: self.status.parse().map_err(|_| {
                DomainError::Storage(format!("order {} has unknown status '{}'", self.id, self.status))
            })?,
            payment_status: self.payment_status.parse().map_err(|_| {
                DomainError::Storage(format!(
                    "order {} has unknown payment status '{}'",
                    self.id, self.payment_status
                ))
            })?,
            store_id: self.store_id,
            customer: Customer {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                address: self.shipping_address,
            },
            lines: lines
                .into_iter()
                .map(|l| OrderLine {
                    product_id: l.product_id,
                    name: l.name,
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                })
                .collect(),
            total: self.total,
            currency: self.currency,
            payment_id: self.payment_id,
            payment_url: self.payment_url,
            payment_method: self.payment_method,
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
