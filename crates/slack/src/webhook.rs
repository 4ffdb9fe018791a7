use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

use shotbot_core::config::SlackConfig;

use crate::blocks::MessageTemplate;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to build webhook HTTP client: {0}")]
    Client(String),
    #[error("webhook delivery failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookRoute {
    Prod,
    Dev,
}

/// Channels without a name, or whose name mentions `dev`, go to the dev webhook.
pub fn route_for_channel(channel_name: &str) -> WebhookRoute {
    if channel_name.is_empty() || channel_name.contains("dev") {
        WebhookRoute::Dev
    } else {
        WebhookRoute::Prod
    }
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn deliver(
        &self,
        channel_name: &str,
        message: &MessageTemplate,
    ) -> Result<(), DeliveryError>;
}

pub struct IncomingWebhookSink {
    client: reqwest::Client,
    prod_url: SecretString,
    dev_url: SecretString,
}

impl IncomingWebhookSink {
    pub fn new(config: &SlackConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| DeliveryError::Client(error.to_string()))?;

        Ok(Self {
            client,
            prod_url: config.prod_webhook_url.clone(),
            dev_url: config.dev_webhook_url.clone(),
        })
    }

    fn url_for(&self, route: WebhookRoute) -> &str {
        match route {
            WebhookRoute::Prod => self.prod_url.expose_secret(),
            WebhookRoute::Dev => self.dev_url.expose_secret(),
        }
    }
}

#[async_trait]
impl MessageSink for IncomingWebhookSink {
    async fn deliver(
        &self,
        channel_name: &str,
        message: &MessageTemplate,
    ) -> Result<(), DeliveryError> {
        let route = route_for_channel(channel_name);
        let response = self
            .client
            .post(self.url_for(route))
            .json(&message.webhook_payload())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "slack.webhook.rejected",
                channel_name,
                status = status.as_u16(),
                "incoming webhook rejected message"
            );
            return Err(DeliveryError::Rejected { status: status.as_u16(), body });
        }

        debug!(
            event_name = "slack.webhook.delivered",
            channel_name,
            route = ?route,
            "reply delivered"
        );
        Ok(())
    }
}
