use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use modista_agent::engine::ConversationEngine;
use modista_agent::llm::{LlmError, OpenAiClient};
use modista_agent::tools::ToolExecutor;
use modista_core::config::{AppConfig, ConfigError, LoadOptions};
use modista_db::repositories::{
    SqlCatalogRepository, SqlConversationRepository, SqlOrderRepository,
};
use modista_db::{connect, migrations, DbPool};
use modista_telegram::api::{ApiError, BotApi};
use modista_telegram::router::MessageRouter;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub message_router: Arc<MessageRouter>,
    pub bot: Arc<BotApi>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("model client initialization failed: {0}")]
    Llm(#[from] LlmError),
    #[error("bot api client initialization failed: {0}")]
    Telegram(#[from] ApiError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool =
        connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let catalog = Arc::new(SqlCatalogRepository::new(db_pool.clone()));
    let conversations = Arc::new(SqlConversationRepository::new(db_pool.clone()));
    let orders = Arc::new(SqlOrderRepository::new(db_pool.clone()));

    let model = Arc::new(OpenAiClient::new(&config.llm)?);
    let engine =
        ConversationEngine::new(model, ToolExecutor::new(catalog.clone(), orders));
    let message_router = Arc::new(MessageRouter::new(
        engine,
        conversations,
        catalog,
        config.admin.ids.iter().copied(),
    ));

    let bot = Arc::new(BotApi::new(&config.telegram.bot_token)?);

    Ok(Application { config, db_pool, message_router, bot })
}
