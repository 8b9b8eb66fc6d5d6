pub mod memory_repo;
pub mod models;
pub mod mollie;
pub mod order_repo;
