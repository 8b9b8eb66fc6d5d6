use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::checkout::to_cents;
use super::order::{Order, OrderStatus, PaymentStatus, PaymentUpdate, CURRENCY};

#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub currency: String,
    pub value: BigDecimal,
}

impl Money {
    pub fn eur(value: BigDecimal) -> Self {
        Self {
            currency: CURRENCY.to_string(),
            value,
        }
    }

    /// The amount with exactly two decimals, as payment providers expect it.
    pub fn formatted_value(&self) -> String {
        to_cents(&self.value).to_string()
    }
}

/// Values attached to a payment so the webhook can find its order again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMetadata {
    pub order_id: Uuid,
    pub store_id: String,
    pub customer_email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Money,
    pub description: String,
    pub redirect_url: String,
    pub webhook_url: String,
    pub metadata: PaymentMetadata,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPayment {
    pub id: String,
    pub checkout_url: String,
}

/// Payment statuses reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Open,
    Pending,
    Authorized,
    Paid,
    Failed,
    Canceled,
    Expired,
    Other(String),
}

impl GatewayPaymentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "open" => GatewayPaymentStatus::Open,
            "pending" => GatewayPaymentStatus::Pending,
            "authorized" => GatewayPaymentStatus::Authorized,
            "paid" => GatewayPaymentStatus::Paid,
            "failed" => GatewayPaymentStatus::Failed,
            "canceled" => GatewayPaymentStatus::Canceled,
            "expired" => GatewayPaymentStatus::Expired,
            other => GatewayPaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GatewayPaymentStatus::Open => "open",
            GatewayPaymentStatus::Pending => "pending",
            GatewayPaymentStatus::Authorized => "authorized",
            GatewayPaymentStatus::Paid => "paid",
            GatewayPaymentStatus::Failed => "failed",
            GatewayPaymentStatus::Canceled => "canceled",
            GatewayPaymentStatus::Expired => "expired",
            GatewayPaymentStatus::Other(raw) => raw,
        }
    }
}

/// The gateway's authoritative view of a payment.
///
/// `order_id` and `store_id` come from the metadata attached at creation;
/// they are `None` when the metadata is missing or unreadable.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayPayment {
    pub id: String,
    pub status: GatewayPaymentStatus,
    pub method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub amount: Option<Money>,
    pub order_id: Option<Uuid>,
    pub store_id: Option<String>,
}

impl GatewayPayment {
    /// True when the gateway reports an amount other than the order's total.
    /// A payment without an amount is not compared.
    pub fn amount_differs_from(&self, order: &Order) -> bool {
        self.amount.as_ref().is_some_and(|amount| {
            amount.currency != order.currency || to_cents(&amount.value) != to_cents(&order.total)
        })
    }
}

/// Derive the order fields implied by the gateway's current payment state.
///
/// Returns `None` for statuses the gateway may add in the future; those are
/// left alone rather than guessed at. The result depends only on the gateway
/// record and the stored order, so replaying a notification writes the same
/// values again.
pub fn plan_payment_update(
    order: &Order,
    payment: &GatewayPayment,
    now: DateTime<Utc>,
) -> Option<PaymentUpdate> {
    let (status, payment_status) = match &payment.status {
        GatewayPaymentStatus::Paid => {
            // Never pull an order that is already being fulfilled back to confirmed.
            let status = (!order.status.is_fulfillment()).then_some(OrderStatus::Confirmed);
            (status, PaymentStatus::Paid)
        }
        GatewayPaymentStatus::Failed => (Some(OrderStatus::Cancelled), PaymentStatus::Failed),
        GatewayPaymentStatus::Canceled => (Some(OrderStatus::Cancelled), PaymentStatus::Canceled),
        GatewayPaymentStatus::Open => (None, PaymentStatus::AwaitingPayment),
        GatewayPaymentStatus::Pending | GatewayPaymentStatus::Authorized => {
            (None, PaymentStatus::Pending)
        }
        GatewayPaymentStatus::Expired => (None, PaymentStatus::Expired),
        GatewayPaymentStatus::Other(_) => return None,
    };

    let paid_at = match payment_status {
        PaymentStatus::Paid => payment.paid_at.or(order.paid_at).or(Some(now)),
        _ => None,
    };

    Some(PaymentUpdate {
        status,
        payment_status,
        payment_method: payment.method.clone(),
        paid_at,
        payment_id: order
            .payment_id
            .is_none()
            .then(|| payment.id.clone()),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::order::Customer;

    fn order(status: OrderStatus, payment_status: PaymentStatus) -> Order {
        let created = Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap();
        Order {
            id: Uuid::new_v4(),
            store_id: "demo".to_string(),
            customer: Customer {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: "123".to_string(),
                address: "Street 1".to_string(),
            },
            lines: vec![],
            total: "50.00".parse().unwrap(),
            currency: CURRENCY.to_string(),
            status,
            payment_status,
            payment_id: Some("tr_123".to_string()),
            payment_url: Some("https://pay.example/tr_123".to_string()),
            payment_method: None,
            paid_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn payment(status: GatewayPaymentStatus) -> GatewayPayment {
        GatewayPayment {
            id: "tr_123".to_string(),
            status,
            method: Some("creditcard".to_string()),
            paid_at: None,
            amount: Some(Money::eur("50.00".parse().unwrap())),
            order_id: None,
            store_id: Some("demo".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn paid_confirms_the_order_with_gateway_timestamp() {
        let paid_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut paid = payment(GatewayPaymentStatus::Paid);
        paid.paid_at = Some(paid_at);

        let update = plan_payment_update(
            &order(OrderStatus::Pending, PaymentStatus::AwaitingPayment),
            &paid,
            now(),
        )
        .unwrap();

        assert_eq!(update.status, Some(OrderStatus::Confirmed));
        assert_eq!(update.payment_status, PaymentStatus::Paid);
        assert_eq!(update.payment_method.as_deref(), Some("creditcard"));
        assert_eq!(update.paid_at, Some(paid_at));
        assert_eq!(update.payment_id, None);
    }

    #[test]
    fn paid_without_gateway_timestamp_keeps_the_stored_one() {
        let stored = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        let mut existing = order(OrderStatus::Confirmed, PaymentStatus::Paid);
        existing.paid_at = Some(stored);

        let update =
            plan_payment_update(&existing, &payment(GatewayPaymentStatus::Paid), now()).unwrap();
        assert_eq!(update.paid_at, Some(stored));

        let fresh = order(OrderStatus::Pending, PaymentStatus::AwaitingPayment);
        let update =
            plan_payment_update(&fresh, &payment(GatewayPaymentStatus::Paid), now()).unwrap();
        assert_eq!(update.paid_at, Some(now()));
    }

    #[test]
    fn paid_does_not_regress_fulfillment() {
        let update = plan_payment_update(
            &order(OrderStatus::Shipped, PaymentStatus::Paid),
            &payment(GatewayPaymentStatus::Paid),
            now(),
        )
        .unwrap();
        assert_eq!(update.status, None);
        assert_eq!(update.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn failed_and_canceled_cancel_the_order_and_clear_paid_at() {
        for (gateway, expected) in [
            (GatewayPaymentStatus::Failed, PaymentStatus::Failed),
            (GatewayPaymentStatus::Canceled, PaymentStatus::Canceled),
        ] {
            let update = plan_payment_update(
                &order(OrderStatus::Pending, PaymentStatus::AwaitingPayment),
                &payment(gateway),
                now(),
            )
            .unwrap();
            assert_eq!(update.status, Some(OrderStatus::Cancelled));
            assert_eq!(update.payment_status, expected);
            assert_eq!(update.paid_at, None);
        }
    }

    #[test]
    fn intermediate_statuses_only_refresh_payment_status() {
        let cases = [
            (GatewayPaymentStatus::Open, PaymentStatus::AwaitingPayment),
            (GatewayPaymentStatus::Pending, PaymentStatus::Pending),
            (GatewayPaymentStatus::Authorized, PaymentStatus::Pending),
            (GatewayPaymentStatus::Expired, PaymentStatus::Expired),
        ];
        for (gateway, expected) in cases {
            let update = plan_payment_update(
                &order(OrderStatus::Pending, PaymentStatus::AwaitingPayment),
                &payment(gateway),
                now(),
            )
            .unwrap();
            assert_eq!(update.status, None);
            assert_eq!(update.payment_status, expected);
            assert_eq!(update.paid_at, None);
        }
    }

    #[test]
    fn unknown_status_plans_nothing() {
        let update = plan_payment_update(
            &order(OrderStatus::Pending, PaymentStatus::AwaitingPayment),
            &payment(GatewayPaymentStatus::parse("chargeback_pending")),
            now(),
        );
        assert!(update.is_none());
    }

    #[test]
    fn missing_linkage_is_repaired_from_the_gateway_record() {
        let mut unlinked = order(OrderStatus::Pending, PaymentStatus::AwaitingPayment);
        unlinked.payment_id = None;
        let update =
            plan_payment_update(&unlinked, &payment(GatewayPaymentStatus::Paid), now()).unwrap();
        assert_eq!(update.payment_id.as_deref(), Some("tr_123"));
    }

    #[test]
    fn gateway_status_names_round_trip() {
        for raw in ["open", "pending", "authorized", "paid", "failed", "canceled", "expired"] {
            assert_eq!(GatewayPaymentStatus::parse(raw).as_str(), raw);
        }
        assert_eq!(
            GatewayPaymentStatus::parse("refunded"),
            GatewayPaymentStatus::Other("refunded".to_string())
        );
    }

    #[test]
    fn money_is_formatted_with_two_decimals() {
        assert_eq!(Money::eur("50".parse().unwrap()).formatted_value(), "50.00");
        assert_eq!(Money::eur("19.999".parse().unwrap()).formatted_value(), "20.00");
    }

    #[test]
    fn amount_is_compared_with_the_order_total() {
        let order = order(OrderStatus::Pending, PaymentStatus::AwaitingPayment);
        let mut p = payment(GatewayPaymentStatus::Paid);
        assert!(!p.amount_differs_from(&order));

        p.amount = Some(Money::eur("50".parse().unwrap()));
        assert!(!p.amount_differs_from(&order));

        p.amount = Some(Money::eur("49.99".parse().unwrap()));
        assert!(p.amount_differs_from(&order));

        p.amount = Some(Money {
            currency: "USD".to_string(),
            value: "50.00".parse().unwrap(),
        });
        assert!(p.amount_differs_from(&order));

        p.amount = None;
        assert!(!p.amount_differs_from(&order));
    }
}
