use std::sync::Arc;

use axum::Router;
use shotbot_core::config::{AppConfig, ConfigError, LoadOptions};
use shotbot_core::guard::DuplicateGuard;
use shotbot_core::scoring::ScoringEngine;
use shotbot_core::session::{SessionSegmenter, SystemClock};
use shotbot_db::{connect_from_config, migrations, DbPool, SqlHistoryRepository};
use shotbot_slack::events::MessageEventHandler;
use shotbot_slack::web::{SlackApiError, SlackWebClient};
use shotbot_slack::webhook::{DeliveryError, IncomingWebhookSink};
use thiserror::Error;
use tracing::info;

use crate::processor::EventProcessor;
use crate::service::ShotService;
use crate::{health, webhook};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub processor: Arc<EventProcessor<ShotService>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack web client setup failed: {0}")]
    SlackClient(#[from] SlackApiError),
    #[error("slack webhook setup failed: {0}")]
    SlackWebhook(#[from] DeliveryError),
}

impl Application {
    pub fn router(&self) -> Router {
        Router::new()
            .merge(webhook::router(Arc::clone(&self.processor)))
            .merge(health::router(self.db_pool.clone()))
    }
}

pub fn scoring_engine(config: &AppConfig) -> ScoringEngine {
    ScoringEngine::new(
        SessionSegmenter::new(config.scoring.session_gap_secs as f64),
        Arc::new(SystemClock),
    )
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    let slack = Arc::new(SlackWebClient::new(&config.slack)?);
    let sink = Arc::new(IncomingWebhookSink::new(&config.slack)?);
    let service = ShotService::new(
        Arc::new(SqlHistoryRepository::new(db_pool.clone())),
        slack.clone(),
        scoring_engine(&config),
        DuplicateGuard::new(config.scoring.duplicate_lookback),
    );
    let processor = Arc::new(EventProcessor::new(MessageEventHandler::new(service, slack), sink));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        session_gap_secs = config.scoring.session_gap_secs,
        duplicate_lookback = config.scoring.duplicate_lookback,
        "application wired"
    );

    Ok(Application { config, db_pool, processor })
}
