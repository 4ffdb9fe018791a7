use serde::{Deserialize, Serialize};

use crate::domain::history::{History, UserId};
use crate::scoring::ScoringEngine;

/// Raw candidate as handed back by store enumeration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserHistory {
    pub user_id: UserId,
    pub history: History,
}

impl UserHistory {
    pub fn new(user_id: UserId, history: History) -> Self {
        Self { user_id, history }
    }
}

/// A user with its derived high score. The score is never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub history: History,
    pub high_score: usize,
}

impl UserRecord {
    pub fn derive(candidate: UserHistory, engine: &ScoringEngine) -> Self {
        let high_score = engine.score(&candidate.history).high_score;
        Self { id: candidate.user_id, history: candidate.history, high_score }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{UserHistory, UserRecord};
    use crate::domain::history::{History, HistoryEvent, UserId};
    use crate::scoring::ScoringEngine;
    use crate::session::FixedClock;

    #[test]
    fn derive_recomputes_high_score_from_history() {
        let engine = ScoringEngine::with_clock(Arc::new(FixedClock(2_000_000.0)));
        let history = History::from_events(vec![
            HistoryEvent::Shot { ts: 1_000_000.0 },
            HistoryEvent::Shot { ts: 1_000_100.0 },
            HistoryEvent::Shot { ts: 1_000_200.0 },
        ]);

        let record = UserRecord::derive(UserHistory::new(UserId::new("U1"), history), &engine);

        assert_eq!(record.high_score, 3);
        assert_eq!(record.id, UserId::new("U1"));
    }

    #[test]
    fn default_candidate_is_an_empty_placeholder() {
        let candidate = UserHistory::default();
        assert!(candidate.user_id.is_placeholder());
        assert!(candidate.history.is_empty());
    }
}
