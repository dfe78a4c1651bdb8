//! Application state for admin service.

use std::time::Duration;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pool: PgPool,
}

impl AppState {
    /// Creates a new application state with a pool on the managed database.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.database_url())
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        Ok(Self { config, pool })
    }
}
