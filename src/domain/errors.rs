use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order not found")]
    NotFound,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Payment initiation failed: {0}")]
    PaymentInitiation(String),
    #[error("Orphan payment {payment_id}: {reason}")]
    OrphanPayment { payment_id: String, reason: String },
    #[error("Gateway lookup failed: {0}")]
    GatewayLookup(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn orphan(payment_id: &str, reason: impl Into<String>) -> Self {
        DomainError::OrphanPayment {
            payment_id: payment_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures reported by a payment gateway adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("payment {0} not found at the gateway")]
    NotFound(String),
    #[error("gateway rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("gateway request timed out")]
    Timeout,
    #[error("gateway transport error: {0}")]
    Transport(String),
    #[error("unexpected gateway response: {0}")]
    Decode(String),
}
