pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;
pub mod state;

#[cfg(test)]
mod test_utils;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use auth::TokenVerifier;
pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use state::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Routes and body limits. `AppState` and `TokenVerifier` come from the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .service(
            web::resource("/cart")
                .route(web::get().to(handlers::cart::get_cart))
                .route(web::post().to(handlers::cart::add_to_cart))
                .route(web::put().to(handlers::cart::update_cart_quantity))
                .route(web::delete().to(handlers::cart::remove_cart_item)),
        )
        .route("/checkout", web::post().to(handlers::checkout::card_checkout))
        .route(
            "/paypal-checkout",
            web::post().to(handlers::checkout::paypal_checkout),
        )
        .route(
            "/cash-on-delivery",
            web::post().to(handlers::orders::cash_on_delivery),
        )
        .route("/orders", web::get().to(handlers::orders::list_orders))
        .route("/webhook", web::post().to(handlers::webhooks::card_webhook))
        .route(
            "/paypal-webhook",
            web::post().to(handlers::webhooks::paypal_webhook),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    verifier: TokenVerifier,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let verifier = web::Data::new(verifier);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(verifier.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
