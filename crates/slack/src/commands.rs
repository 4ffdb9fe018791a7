use async_trait::async_trait;
use thiserror::Error;

use shotbot_core::domain::history::{HistoryEvent, UserId};
use shotbot_core::errors::{ApplicationError, DomainError};

use crate::blocks::MessageTemplate;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShotCommand {
    Shot,
    Score,
    LimitQuery,
    SetLimit(u32),
    Leaderboard,
    Reset,
}

/// Everything a command handler needs to know about where a message came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub user_id: UserId,
    pub channel_id: String,
    pub channel_name: String,
    /// Slack message timestamp, e.g. `1730000000.123400`.
    pub message_ts: String,
    pub request_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("`{0}` is not a valid drink limit")]
    InvalidLimit(String),
}

#[derive(Debug, Error)]
pub enum CommandRouteError {
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error("message timestamp `{0}` is not a valid shot time")]
    InvalidTimestamp(String),
}

/// Parses message text into a command. Text that isn't a command yields `Ok(None)`.
///
/// Matching is case-insensitive on the trimmed text. `limit <N>` must be exactly two words
/// separated by a single space.
pub fn parse_shot_command(text: &str) -> Result<Option<ShotCommand>, CommandParseError> {
    let normalized = text.to_lowercase();
    let normalized = normalized.trim();

    let words: Vec<&str> = normalized.split(' ').collect();
    if let ["limit", argument] = words.as_slice() {
        return parse_limit_argument(argument).map(|limit| Some(ShotCommand::SetLimit(limit)));
    }

    Ok(match normalized {
        "shot" => Some(ShotCommand::Shot),
        "score" => Some(ShotCommand::Score),
        "limit" => Some(ShotCommand::LimitQuery),
        "leaderboard" => Some(ShotCommand::Leaderboard),
        "reset" => Some(ShotCommand::Reset),
        _ => None,
    })
}

fn parse_limit_argument(argument: &str) -> Result<u32, CommandParseError> {
    let invalid = || CommandParseError::InvalidLimit(argument.to_owned());
    let value = argument.parse::<i64>().map_err(|_| invalid())?;
    match HistoryEvent::limit(value) {
        Ok(HistoryEvent::Limit { limit }) => Ok(limit),
        _ => Err(invalid()),
    }
}

pub fn parse_message_ts(message_ts: &str) -> Result<f64, CommandRouteError> {
    let invalid = || CommandRouteError::InvalidTimestamp(message_ts.to_owned());
    let ts = message_ts.trim().parse::<f64>().map_err(|_| invalid())?;
    HistoryEvent::shot(ts).map_err(|_: DomainError| invalid())?;
    Ok(ts)
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: ShotCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn route(
        &self,
        command: ShotCommand,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        match command {
            ShotCommand::Shot => {
                let ts = parse_message_ts(&envelope.message_ts)?;
                self.service.record_shot(ts, envelope).await
            }
            ShotCommand::Score => self.service.high_score(envelope).await,
            ShotCommand::LimitQuery => self.service.limit_status(envelope).await,
            ShotCommand::SetLimit(limit) => self.service.set_limit(limit, envelope).await,
            ShotCommand::Leaderboard => self.service.leaderboard(envelope).await,
            ShotCommand::Reset => self.service.reset(envelope).await,
        }
    }
}

/// Application operations behind each chat command. Each returns the replies to post,
/// in order; an empty list means nothing is said.
#[async_trait]
pub trait ShotCommandService: Send + Sync {
    async fn record_shot(
        &self,
        ts: f64,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError>;

    async fn high_score(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError>;

    async fn limit_status(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError>;

    async fn set_limit(
        &self,
        limit: u32,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError>;

    async fn leaderboard(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError>;

    async fn reset(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError>;
}
