use std::net::SocketAddr;

use anyhow::Result;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

use api::config::Config;
use api::observability::Observability;
use api::routes;
use api::state::AppState;
use api::validation::ValidationMessages;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = Config::from_env()?;
    let obs = Observability::init(&config)?;

    let pool = PgPoolOptions::new()
        .min_connections(config.db_min_connections)
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../database/migrations").run(&pool).await?;

    tracing::info!("Database connected and migrations applied");

    let state = AppState::new(pool, obs.registry.clone(), &ValidationMessages::default());
    let app = routes::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(env = ?config.env, "API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    obs.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
