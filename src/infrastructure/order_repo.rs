use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, Order, OrderStatus, PaymentLink, PaymentStatus, PaymentUpdate, CURRENCY,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_lines, orders};

use super::models::{NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow, PaymentChangeset};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run blocking Diesel work on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, DomainError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?
    }
}

fn load_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<Order>, DomainError> {
    let order = orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };

    let lines = order_lines::table
        .filter(order_lines::order_id.eq(order.id))
        .select(OrderLineRow::as_select())
        .order(order_lines::position.asc())
        .load(conn)?;

    order.into_domain(lines).map(Some)
}

fn order_exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, DomainError> {
    Ok(diesel::select(diesel::dsl::exists(orders::table.filter(orders::id.eq(id)))).get_result(conn)?)
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Uuid, DomainError> {
        self.with_conn(move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                // 1. Insert the order
                let order_id = Uuid::new_v4();
                diesel::insert_into(orders::table)
                    .values(&NewOrderRow {
                        id: order_id,
                        store_id: order.store_id,
                        customer_name: order.customer.name,
                        customer_email: order.customer.email,
                        customer_phone: order.customer.phone,
                        shipping_address: order.customer.address,
                        total: order.total,
                        currency: CURRENCY.to_string(),
                        status: OrderStatus::Pending.as_str().to_string(),
                        payment_status: PaymentStatus::AwaitingPayment.as_str().to_string(),
                    })
                    .execute(conn)?;

                // 2. Insert the line item snapshot, keeping cart order
                let new_lines: Vec<NewOrderLineRow> = order
                    .lines
                    .into_iter()
                    .enumerate()
                    .map(|(position, l)| NewOrderLineRow {
                        id: Uuid::new_v4(),
                        order_id,
                        position: position as i32,
                        product_id: l.product_id,
                        name: l.name,
                        unit_price: l.unit_price,
                        quantity: l.quantity,
                    })
                    .collect();
                diesel::insert_into(order_lines::table)
                    .values(&new_lines)
                    .execute(conn)?;

                Ok(order_id)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.with_conn(move |conn| load_order(conn, id)).await
    }

    async fn attach_payment(&self, id: Uuid, link: PaymentLink) -> Result<(), DomainError> {
        self.with_conn(move |conn| {
            let updated = diesel::update(
                orders::table
                    .filter(orders::id.eq(id))
                    .filter(orders::payment_id.is_null()),
            )
            .set((
                orders::payment_id.eq(&link.payment_id),
                orders::payment_url.eq(&link.payment_url),
                orders::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

            if updated == 1 {
                Ok(())
            } else if order_exists(conn, id)? {
                Err(DomainError::Conflict(format!(
                    "order {id} already has a payment linked"
                )))
            } else {
                Err(DomainError::NotFound)
            }
        })
        .await
    }

    async fn apply_payment_update(
        &self,
        id: Uuid,
        update: PaymentUpdate,
    ) -> Result<(), DomainError> {
        self.with_conn(move |conn| {
            let updated = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set(&PaymentChangeset::new(update, Utc::now()))
                .execute(conn)?;
            if updated == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), DomainError> {
        self.with_conn(move |conn| {
            let updated = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((
                    orders::status.eq(status.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn list_for_store(
        &self,
        store_id: &str,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let store_id = store_id.to_string();
        let offset = (page - 1).saturating_mul(limit);

        self.with_conn(move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                let mut count_query = orders::table
                    .filter(orders::store_id.eq(&store_id))
                    .into_boxed();
                let mut rows_query = orders::table
                    .filter(orders::store_id.eq(&store_id))
                    .select(OrderRow::as_select())
                    .into_boxed();
                if let Some(status) = status {
                    count_query = count_query.filter(orders::status.eq(status.as_str()));
                    rows_query = rows_query.filter(orders::status.eq(status.as_str()));
                }

                let total: i64 = count_query.count().get_result(conn)?;
                let rows: Vec<OrderRow> = rows_query
                    .order(orders::created_at.desc())
                    .limit(limit)
                    .offset(offset)
                    .load(conn)?;

                let lines = OrderLineRow::belonging_to(&rows)
                    .select(OrderLineRow::as_select())
                    .load(conn)?;

                let items = lines
                    .grouped_by(&rows)
                    .into_iter()
                    .zip(rows)
                    .map(|(lines, order)| order.into_domain(lines))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ListResult { items, total })
            })
        })
        .await
    }
}
