use std::sync::Arc;

use sentinel_agent::{HttpLlmClient, LlmError, PriceEstimator};
use sentinel_core::config::{AppConfig, ConfigError};
use sentinel_db::repositories::{SqlAlertRepository, SqlProfileRepository};
use sentinel_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client setup failed: {0}")]
    Llm(#[source] LlmError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_provider = %config.llm.provider,
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let client = HttpLlmClient::from_config(&config.llm).map_err(BootstrapError::Llm)?;
    let state = AppState::new(
        Arc::new(SqlProfileRepository::new(db_pool.clone())),
        Arc::new(SqlAlertRepository::new(db_pool.clone())),
        PriceEstimator::new(Arc::new(client)),
    );

    Ok(Application { config, db_pool, state })
}
