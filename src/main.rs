use employee_directory::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the store and the HTTP server, in that order.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration (fail fast on missing production settings)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging: RUST_LOG wins, otherwise sensible development defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "employee_directory=debug,tower_http=info".into());

    // Pretty output locally, JSON for log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Store
    let repo: RepositoryState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Connected to Postgres and applied migrations.");
            Arc::new(PostgresRepository::new(pool))
        }
        None => {
            // Only reachable in Env::Local; production requires DATABASE_URL.
            tracing::warn!("DATABASE_URL not set; using the in-memory store. Data will not persist.");
            Arc::new(InMemoryRepository::new())
        }
    };

    // 4. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { repo, config });

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("OpenAPI document available at /api-docs/openapi.json");

    axum::serve(listener, app).await?;
    Ok(())
}
