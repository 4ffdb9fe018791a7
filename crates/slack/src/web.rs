//! Slack Web API lookups used to name users and channels.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use shotbot_core::config::SlackConfig;
use shotbot_core::domain::history::UserId;
use shotbot_core::identity::{IdentityError, IdentityResolver};

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("failed to build Slack HTTP client: {0}")]
    Client(String),
    #[error("Slack API request to `{method}` failed: {source}")]
    Transport { method: &'static str, source: reqwest::Error },
    #[error("Slack API `{method}` returned an error: {error}")]
    Api { method: &'static str, error: String },
}

/// Resolves a channel id to its name (without the leading `#`).
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    async fn channel_name(&self, channel_id: &str) -> Result<String, SlackApiError>;
}

#[derive(Debug, Default, Deserialize)]
struct UsersInfoResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<SlackUser>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackUser {
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackProfile {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    real_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationsInfoResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<SlackChannel>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackChannel {
    #[serde(default)]
    name: String,
}

fn display_name_from(response: UsersInfoResponse) -> Result<String, SlackApiError> {
    if !response.ok {
        return Err(SlackApiError::Api {
            method: "users.info",
            error: response.error.unwrap_or_else(|| "unknown_error".to_owned()),
        });
    }

    let profile = response.user.map(|user| user.profile).unwrap_or_default();
    if profile.display_name.is_empty() {
        Ok(profile.real_name)
    } else {
        Ok(profile.display_name)
    }
}

fn channel_name_from(response: ConversationsInfoResponse) -> Result<String, SlackApiError> {
    if !response.ok {
        return Err(SlackApiError::Api {
            method: "conversations.info",
            error: response.error.unwrap_or_else(|| "unknown_error".to_owned()),
        });
    }

    Ok(response.channel.map(|channel| channel.name).unwrap_or_default())
}

#[derive(Clone)]
pub struct SlackWebClient {
    client: reqwest::Client,
    bot_token: SecretString,
    api_base_url: String,
}

impl SlackWebClient {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| SlackApiError::Client(error.to_string()))?;

        Ok(Self {
            client,
            bot_token: config.bot_token.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url)
    }

    async fn call<T>(&self, method: &'static str, params: &[(&str, &str)]) -> Result<T, SlackApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!(event_name = "slack.web.request", method, "calling Slack Web API");

        self.client
            .post(self.method_url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .form(params)
            .send()
            .await
            .map_err(|source| SlackApiError::Transport { method, source })?
            .json::<T>()
            .await
            .map_err(|source| SlackApiError::Transport { method, source })
    }

    pub async fn user_display_name(&self, user_id: &str) -> Result<String, SlackApiError> {
        let response: UsersInfoResponse = self.call("users.info", &[("user", user_id)]).await?;
        display_name_from(response)
    }
}

#[async_trait]
impl ChannelResolver for SlackWebClient {
    async fn channel_name(&self, channel_id: &str) -> Result<String, SlackApiError> {
        let response: ConversationsInfoResponse =
            self.call("conversations.info", &[("channel", channel_id)]).await?;
        channel_name_from(response)
    }
}

#[async_trait]
impl IdentityResolver for SlackWebClient {
    async fn resolve_display_name(&self, user_id: &UserId) -> Result<String, IdentityError> {
        self.user_display_name(user_id.as_str()).await.map_err(|error| IdentityError::Lookup {
            user_id: user_id.to_string(),
            reason: error.to_string(),
        })
    }
}
