//! Leaderboard ranking.
//!
//! Candidates come straight from store enumeration and may include placeholder records with
//! no identity. Those, and any user whose display name resolves empty or fails to resolve,
//! are left off the board. Ordering is a stable sort on high score, so ties keep the order
//! the store produced them in.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::user::{UserHistory, UserRecord};
use crate::identity::IdentityResolver;
use crate::scoring::ScoringEngine;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub high_score: usize,
}

pub struct LeaderboardRanker<'a> {
    engine: &'a ScoringEngine,
    resolver: &'a dyn IdentityResolver,
}

impl<'a> LeaderboardRanker<'a> {
    pub fn new(engine: &'a ScoringEngine, resolver: &'a dyn IdentityResolver) -> Self {
        Self { engine, resolver }
    }

    pub async fn rank(&self, candidates: Vec<UserHistory>) -> Vec<LeaderboardEntry> {
        let mut entries = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate.user_id.is_placeholder() {
                debug!(
                    event_name = "leaderboard.placeholder_skipped",
                    "skipping placeholder record"
                );
                continue;
            }

            let record = UserRecord::derive(candidate, self.engine);
            let display_name = match self.resolver.resolve_display_name(&record.id).await {
                Ok(name) => name,
                Err(error) => {
                    warn!(
                        event_name = "leaderboard.identity_unresolved",
                        user_id = %record.id,
                        error = %error,
                        "skipping leaderboard entry"
                    );
                    continue;
                }
            };
            if display_name.is_empty() {
                continue;
            }

            entries.push(LeaderboardEntry { display_name, high_score: record.high_score });
        }

        entries.sort_by(|left, right| right.high_score.cmp(&left.high_score));
        entries
    }
}
