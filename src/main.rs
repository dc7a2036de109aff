use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use foodgram_sdk::config::Config;
use foodgram_sdk::error::ApiError;
use foodgram_sdk::rejection;
use foodgram_sdk::routes::routes;
use warp::Filter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ApiError> {
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| ApiError::Config(format!("Migration failed: {e}")))?;

    let api = routes(pool, config.media_root.clone()).recover(rejection::handle_rejection);

    log::info!("Listening on {}", config.bind_addr);
    warp::serve(api).run(config.bind_addr).await;
    Ok(())
}
