use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use storefront_checkout::config::{AppConfig, StoreBackend};
use storefront_checkout::domain::ports::OrderRepository;
use storefront_checkout::infrastructure::memory_repo::InMemoryOrderRepository;
use storefront_checkout::infrastructure::mollie::MollieGateway;
use storefront_checkout::infrastructure::order_repo::DieselOrderRepository;
use storefront_checkout::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let repo: Arc<dyn OrderRepository> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let pool = create_pool(database_url);
            run_migrations(&pool);
            Arc::new(DieselOrderRepository::new(pool))
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory order store; orders are lost on restart");
            Arc::new(InMemoryOrderRepository::default())
        }
    };
    let gateway = MollieGateway::new(&config.mollie).map_err(io::Error::other)?;

    let state = AppState::new(repo, Arc::new(gateway), config.checkout);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
