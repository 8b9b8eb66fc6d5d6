use bigdecimal::{BigDecimal, RoundingMode};

use super::errors::DomainError;
use super::order::{Customer, NewOrder, OrderLine};

/// A checkout as submitted by the storefront cart. Nothing in here is trusted.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub store_id: String,
    pub items: Vec<OrderLine>,
    pub declared_total: BigDecimal,
    pub customer: Customer,
}

/// Column limits of the order tables.
pub const MAX_STORE_ID_LEN: usize = 100;
pub const MAX_PRODUCT_ID_LEN: usize = 255;

/// Largest amount a `NUMERIC(12, 2)` total holds: 9999999999.99.
pub fn max_total() -> BigDecimal {
    BigDecimal::new(999_999_999_999_i64.into(), 2)
}

/// Round to whole cents, the precision totals are compared and stored at.
pub fn to_cents(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

impl NewOrder {
    /// Validate a checkout and recompute its total from the line items.
    pub fn from_checkout(request: CheckoutRequest) -> Result<Self, DomainError> {
        let store_id = request.store_id.trim().to_string();
        if store_id.is_empty() {
            return Err(DomainError::validation("storeId is required"));
        }
        if store_id.chars().count() > MAX_STORE_ID_LEN {
            return Err(DomainError::validation(format!(
                "storeId must be at most {MAX_STORE_ID_LEN} characters"
            )));
        }
        if !store_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::validation(format!(
                "storeId '{store_id}' contains invalid characters"
            )));
        }

        let customer = validate_customer(request.customer)?;

        if request.items.is_empty() {
            return Err(DomainError::validation("at least one item is required"));
        }
        let zero = BigDecimal::from(0);
        let mut lines = Vec::with_capacity(request.items.len());
        for (index, item) in request.items.into_iter().enumerate() {
            let product_id = item.product_id.trim().to_string();
            let name = item.name.trim().to_string();
            if product_id.is_empty() {
                return Err(DomainError::validation(format!("items[{index}].id is required")));
            }
            if product_id.chars().count() > MAX_PRODUCT_ID_LEN {
                return Err(DomainError::validation(format!(
                    "items[{index}].id must be at most {MAX_PRODUCT_ID_LEN} characters"
                )));
            }
            if name.is_empty() {
                return Err(DomainError::validation(format!(
                    "items[{index}].name is required"
                )));
            }
            if item.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "items[{index}].quantity must be positive"
                )));
            }
            if item.unit_price < zero {
                return Err(DomainError::validation(format!(
                    "items[{index}].price must not be negative"
                )));
            }
            lines.push(OrderLine {
                product_id,
                name,
                unit_price: item.unit_price,
                quantity: item.quantity,
            });
        }

        let computed = to_cents(
            &lines
                .iter()
                .fold(BigDecimal::from(0), |sum, line| sum + line.subtotal()),
        );
        let max_total = max_total();
        if computed > max_total {
            return Err(DomainError::validation(format!(
                "items total {computed} exceeds the maximum of {max_total}"
            )));
        }
        if request.declared_total < zero {
            return Err(DomainError::validation("total must not be negative"));
        }
        let declared = to_cents(&request.declared_total);
        if declared != computed {
            return Err(DomainError::validation(format!(
                "total {declared} does not match the items total {computed}"
            )));
        }

        Ok(NewOrder {
            store_id,
            customer,
            lines,
            total: computed,
        })
    }
}

fn validate_customer(customer: Customer) -> Result<Customer, DomainError> {
    let customer = Customer {
        name: customer.name.trim().to_string(),
        email: customer.email.trim().to_string(),
        phone: customer.phone.trim().to_string(),
        address: customer.address.trim().to_string(),
    };
    for (field, value) in [
        ("name", &customer.name),
        ("email", &customer.email),
        ("phone", &customer.phone),
        ("address", &customer.address),
    ] {
        if value.is_empty() {
            return Err(DomainError::validation(format!(
                "customerInfo.{field} is required"
            )));
        }
    }
    match customer.email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(customer),
        _ => Err(DomainError::validation(format!(
            "customerInfo.email '{}' is not a valid address",
            customer.email
        ))),
    }
}
