use std::sync::Arc;

use orypto_admin::config::{self, AppConfig};
use orypto_admin::database::{DatabaseManager, EntityStore, MemoryStore, PgStore};
use orypto_admin::{is_production, router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config: &AppConfig = config::config();
    tracing::info!("Starting Orypto Admin API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let store: Arc<dyn EntityStore> = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            Arc::new(PgStore::new(pool))
        }
        None if is_production!() => anyhow::bail!("DATABASE_URL must be set in production"),
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let app = router(AppState::from_config(config.clone(), store));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Orypto Admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
