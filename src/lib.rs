pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::{CheckoutSettings, OrderService};
use application::payment_reconciler::PaymentReconciler;
use domain::ports::{OrderRepository, PaymentGateway};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::checkout::create_checkout,
        handlers::webhook::mollie_webhook,
        handlers::orders::get_order,
        handlers::orders::list_store_orders,
        handlers::orders::update_order_status,
    ),
    tags(
        (name = "checkout", description = "Storefront checkout"),
        (name = "webhook", description = "Payment provider notifications"),
        (name = "orders", description = "Order reads and fulfillment for store operators"),
    )
)]
pub struct ApiDoc;

/// Services shared by every worker of the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub orders: web::Data<OrderService>,
    pub reconciler: web::Data<PaymentReconciler>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        let reconciler =
            PaymentReconciler::new(repo.clone(), gateway.clone(), settings.gateway_timeout);
        Self {
            orders: web::Data::new(OrderService::new(repo, gateway, settings)),
            reconciler: web::Data::new(reconciler),
        }
    }
}

/// Register the API routes. Known paths answer other methods with 405.
pub fn configure_app(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(state.orders.clone())
        .app_data(state.reconciler.clone())
        .app_data(handlers::json_config())
        .service(
            web::resource("/api/checkout/create")
                .route(web::post().to(handlers::checkout::create_checkout))
                .default_service(web::route().to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/api/webhook/mollie")
                .route(web::post().to(handlers::webhook::mollie_webhook))
                .default_service(web::route().to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/api/orders/{id}")
                .route(web::get().to(handlers::orders::get_order))
                .default_service(web::route().to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/api/orders/{id}/status")
                .route(web::patch().to(handlers::orders::update_order_status))
                .default_service(web::route().to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/api/stores/{store_id}/orders")
                .route(web::get().to(handlers::orders::list_store_orders))
                .default_service(web::route().to(handlers::method_not_allowed)),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| configure_app(cfg, &state))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/checkout/create",
            "/api/webhook/mollie",
            "/api/orders/{id}",
            "/api/orders/{id}/status",
            "/api/stores/{store_id}/orders",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
