use std::sync::Arc;

use pollbot_core::config::{AppConfig, ConfigError};
use pollbot_slack::api::{SlackApi, SlackApiError, WebApiClient};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub slack_api: Arc<dyn SlackApi>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack client initialization failed: {0}")]
    SlackClient(#[source] SlackApiError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let client = WebApiClient::from_config(&config.slack).map_err(BootstrapError::SlackClient)?;
    info!(
        event_name = "system.bootstrap.slack_client_ready",
        correlation_id = "bootstrap",
        api_base_url = %config.slack.api_base_url,
        timeout_secs = config.slack.timeout_secs,
        "slack web api client initialized"
    );

    Ok(Application { config, slack_api: Arc::new(client) })
}
