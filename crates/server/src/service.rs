//! Application service behind the chat commands.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use shotbot_core::domain::history::{History, HistoryEvent, UserId};
use shotbot_core::domain::user::UserHistory;
use shotbot_core::errors::ApplicationError;
use shotbot_core::guard::DuplicateGuard;
use shotbot_core::identity::IdentityResolver;
use shotbot_core::leaderboard::LeaderboardRanker;
use shotbot_core::locks::UserLocks;
use shotbot_core::scoring::ScoringEngine;
use shotbot_db::repositories::{HistoryRepository, RepositoryError};
use shotbot_slack::blocks::{self, MessageTemplate};
use shotbot_slack::commands::{CommandEnvelope, CommandRouteError, ShotCommandService};

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

pub struct ShotService {
    repository: Arc<dyn HistoryRepository>,
    identity: Arc<dyn IdentityResolver>,
    engine: ScoringEngine,
    guard: DuplicateGuard,
    locks: UserLocks,
}

impl ShotService {
    pub fn new(
        repository: Arc<dyn HistoryRepository>,
        identity: Arc<dyn IdentityResolver>,
        engine: ScoringEngine,
        guard: DuplicateGuard,
    ) -> Self {
        Self { repository, identity, engine, guard, locks: UserLocks::new() }
    }

    /// First access creates an empty record and reads it back.
    async fn load_or_create(&self, user_id: &UserId) -> Result<History, ApplicationError> {
        if let Some(history) = self.repository.find(user_id).await.map_err(persistence)? {
            return Ok(history);
        }

        self.repository.create(user_id).await.map_err(persistence)?;
        self.repository.find(user_id).await.map_err(persistence)?.ok_or_else(|| {
            ApplicationError::Persistence(format!("history for `{user_id}` missing after create"))
        })
    }

    /// Appends one event under the user's lock and returns the updated history.
    async fn append(
        &self,
        user_id: &UserId,
        event: HistoryEvent,
    ) -> Result<History, ApplicationError> {
        let _guard = self.locks.lock(user_id).await;
        let history = self.load_or_create(user_id).await?.with(event);
        self.repository
            .save(&UserHistory::new(user_id.clone(), history.clone()))
            .await
            .map_err(persistence)?;
        Ok(history)
    }

    async fn read(&self, user_id: &UserId) -> Result<History, ApplicationError> {
        let _guard = self.locks.lock(user_id).await;
        self.load_or_create(user_id).await
    }

    async fn display_name(&self, user_id: &UserId) -> Result<String, ApplicationError> {
        self.identity
            .resolve_display_name(user_id)
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))
    }
}

#[async_trait]
impl ShotCommandService for ShotService {
    async fn record_shot(
        &self,
        ts: f64,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        let user_id = &envelope.user_id;
        let event = HistoryEvent::shot(ts).map_err(ApplicationError::from)?;

        let history = {
            let _guard = self.locks.lock(user_id).await;
            let history = self.load_or_create(user_id).await?;
            if self.guard.is_duplicate(&history, ts) {
                info!(
                    event_name = "shot.duplicate_ignored",
                    correlation_id = %envelope.request_id,
                    user_id = %user_id,
                    ts,
                    "duplicate shot timestamp, not recording"
                );
                return Ok(Vec::new());
            }

            let history = history.with(event);
            self.repository
                .save(&UserHistory::new(user_id.clone(), history.clone()))
                .await
                .map_err(persistence)?;
            history
        };

        let card = self.engine.score(&history);
        info!(
            event_name = "shot.recorded",
            correlation_id = %envelope.request_id,
            user_id = %user_id,
            current_score = card.current_score,
            active_limit = card.legacy_limit(),
            "shot recorded"
        );

        let name = self.display_name(user_id).await?;
        let mut replies = vec![blocks::current_score_message(&name, card.current_score)];
        if let Some(limit) = card.active_limit {
            replies.extend(blocks::limit_warning_message(
                user_id.as_str(),
                card.limit_status(),
                limit,
            ));
        }
        Ok(replies)
    }

    async fn high_score(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        let history = self.read(&envelope.user_id).await?;
        let card = self.engine.score(&history);
        let name = self.display_name(&envelope.user_id).await?;
        Ok(vec![blocks::high_score_message(&name, card.high_score)])
    }

    async fn limit_status(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        let history = self.read(&envelope.user_id).await?;
        let card = self.engine.score(&history);
        let name = self.display_name(&envelope.user_id).await?;
        Ok(vec![blocks::limit_query_message(&name, card.active_limit)])
    }

    async fn set_limit(
        &self,
        limit: u32,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        let event = HistoryEvent::limit(i64::from(limit)).map_err(ApplicationError::from)?;
        // No limit is written for a user that can't be named.
        let name = self.display_name(&envelope.user_id).await?;
        self.append(&envelope.user_id, event).await?;

        info!(
            event_name = "limit.set",
            correlation_id = %envelope.request_id,
            user_id = %envelope.user_id,
            limit,
            "limit recorded"
        );
        Ok(vec![blocks::limit_set_message(&name, limit)])
    }

    async fn leaderboard(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        let candidates = self.repository.list_all().await.map_err(persistence)?;
        let entries = LeaderboardRanker::new(&self.engine, self.identity.as_ref())
            .rank(candidates)
            .await;

        info!(
            event_name = "leaderboard.ranked",
            correlation_id = %envelope.request_id,
            channel_id = %envelope.channel_id,
            entries = entries.len(),
            "leaderboard assembled"
        );
        Ok(vec![blocks::leaderboard_message(&envelope.channel_name, &entries)])
    }

    async fn reset(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
        let history = self.append(&envelope.user_id, HistoryEvent::Reset).await?;
        let card = self.engine.score(&history);

        info!(
            event_name = "score.reset",
            correlation_id = %envelope.request_id,
            user_id = %envelope.user_id,
            "reset marker recorded"
        );
        let name = self.display_name(&envelope.user_id).await?;
        Ok(vec![blocks::current_score_message(&name, card.current_score)])
    }
}
