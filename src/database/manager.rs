use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the PostgreSQL layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    /// Rejected by a column type or constraint; the client can fix the input
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

// SQLSTATE codes that describe bad input rather than a broken server
const CLIENT_SQLSTATES: &[&str] = &[
    "22P02", // invalid_text_representation
    "22007", // invalid_datetime_format
    "23502", // not_null_violation
    "23503", // foreign_key_violation
    "23505", // unique_violation
];

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().is_some_and(|code| CLIENT_SQLSTATES.contains(&code.as_ref())) {
                return DatabaseError::Constraint(db.message().to_string());
            }
        }
        DatabaseError::Sqlx(err)
    }
}

pub struct DatabaseManager;

impl DatabaseManager {
    /// Build the shared connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let parsed = Self::validate_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", parsed.path().trim_start_matches('/'));
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn validate_url(url: &str) -> Result<url::Url, DatabaseError> {
        let parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match parsed.scheme() {
            "postgres" | "postgresql" => Ok(parsed),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }
}
