use std::sync::Arc;

use serde::Serialize;

use crate::domain::history::History;
use crate::session::{Clock, Segmentation, Session, SessionSegmenter, SystemClock};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    /// Longest session that grew by a within-gap shot.
    pub high_score: usize,
    /// Length of the currently open session.
    pub current_score: usize,
    pub active_limit: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitStatus {
    Unset,
    Under { remaining: u32 },
    Approaching,
    Reached,
    Exceeded { by: u32 },
}

impl ScoreCard {
    pub fn from_segmentation(segmentation: &Segmentation) -> Self {
        let current_score = segmentation.current().map(Session::len).unwrap_or_default();
        Self {
            high_score: segmentation.high_score,
            current_score,
            active_limit: segmentation.active_limit,
        }
    }

    /// Limit in the legacy wire form, `-1` when unset.
    pub fn legacy_limit(&self) -> i64 {
        self.active_limit.map(i64::from).unwrap_or(-1)
    }

    pub fn limit_status(&self) -> LimitStatus {
        let Some(limit) = self.active_limit else {
            return LimitStatus::Unset;
        };
        let current = u32::try_from(self.current_score).unwrap_or(u32::MAX);
        match limit.checked_sub(current) {
            Some(0) => LimitStatus::Reached,
            Some(1) => LimitStatus::Approaching,
            Some(remaining) => LimitStatus::Under { remaining },
            None => LimitStatus::Exceeded { by: current - limit },
        }
    }
}

/// Segments and scores histories against a shared clock.
#[derive(Clone)]
pub struct ScoringEngine {
    segmenter: SessionSegmenter,
    clock: Arc<dyn Clock>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl ScoringEngine {
    pub fn new(segmenter: SessionSegmenter, clock: Arc<dyn Clock>) -> Self {
        Self { segmenter, clock }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(SessionSegmenter::default(), clock)
    }

    pub fn segmenter(&self) -> &SessionSegmenter {
        &self.segmenter
    }

    pub fn segment(&self, history: &History) -> Segmentation {
        self.segmenter.segment(history, self.clock.now_unix())
    }

    pub fn score(&self, history: &History) -> ScoreCard {
        ScoreCard::from_segmentation(&self.segment(history))
    }
}
