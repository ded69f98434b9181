use dotenvy::dotenv;
use grocery_checkout::{
    build_server, create_pool, run_migrations, AppConfig, AppState, TokenVerifier,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("configuration error: {}", e);
        e
    })?;

    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let state = AppState::from_config(pool, &config)?;
    let verifier = TokenVerifier::new(&config.access_token_secret);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, verifier, &config.host, config.port)?.await?;
    Ok(())
}
