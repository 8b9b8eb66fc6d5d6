pub mod order_service;
pub mod payment_reconciler;
