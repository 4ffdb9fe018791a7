use std::sync::Arc;

use serde::Serialize;

use crate::commands::CommandResult;
use shotbot_core::codec;
use shotbot_core::session::DEFAULT_SESSION_GAP_SECS;
use shotbot_core::{Clock, FixedClock, ScoreCard, ScoringEngine, SessionSegmenter, SystemClock};

/// Replays a stored history through the scoring engine.
///
/// `input` is the persisted numeric encoding, either bare (`1,2,-5`) or as the JSON array
/// kept in the history column (`[1,2,-5]`).
pub fn run(input: &str, now: Option<f64>, gap_secs: Option<u64>) -> CommandResult {
    let codes = match parse_codes(input) {
        Ok(codes) => codes,
        Err(message) => return CommandResult::failure("analyze", "invalid_history", message, 2),
    };

    let gap_secs = match gap_secs {
        Some(0) => {
            return CommandResult::failure(
                "analyze",
                "invalid_argument",
                "--gap-secs must be greater than zero",
                2,
            );
        }
        Some(gap) => gap as f64,
        None => DEFAULT_SESSION_GAP_SECS,
    };

    let clock: Arc<dyn Clock> = match now {
        Some(now) if !now.is_finite() => {
            return CommandResult::failure(
                "analyze",
                "invalid_argument",
                "--now must be a finite Unix timestamp",
                2,
            );
        }
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };

    let engine = ScoringEngine::new(SessionSegmenter::new(gap_secs), clock);
    let history = codec::decode(&codes);
    let segmentation = engine.segment(&history);
    let card = ScoreCard::from_segmentation(&segmentation);
    let report = AnalysisReport {
        events: history.len(),
        sessions: segmentation.sessions.iter().map(|session| session.len()).collect(),
        high_score: card.high_score,
        current_score: card.current_score,
        active_limit: card.active_limit,
        legacy_limit: card.legacy_limit(),
        gap_secs,
    };

    CommandResult::report("analyze", report.summary(), &report)
}

#[derive(Debug, Serialize)]
struct AnalysisReport {
    events: usize,
    sessions: Vec<usize>,
    high_score: usize,
    current_score: usize,
    active_limit: Option<u32>,
    legacy_limit: i64,
    gap_secs: f64,
}

impl AnalysisReport {
    fn summary(&self) -> String {
        let sessions = self.sessions.iter().map(usize::to_string).collect::<Vec<_>>().join(",");
        let limit =
            self.active_limit.map(|limit| limit.to_string()).unwrap_or_else(|| "unset".into());
        format!(
            "events={} sessions=[{sessions}] high_score={} current_score={} limit={limit}",
            self.events, self.high_score, self.current_score
        )
    }
}

fn parse_codes(input: &str) -> Result<Vec<f64>, String> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed)
        .trim();

    if body.is_empty() {
        return Ok(Vec::new());
    }

    body.split(',')
        .map(str::trim)
        .map(|raw| match raw.parse::<f64>() {
            Ok(code) if code.is_finite() => Ok(code),
            _ => Err(format!("`{raw}` is not a valid history code")),
        })
        .collect()
}
