//! Session segmentation.
//!
//! A session is a maximal run of shots whose consecutive gaps stay within the session gap
//! (12 hours by default). Sessions are derived on every query from the full history and
//! are never persisted.

use crate::codec::RESET_CODE;
use crate::domain::history::{History, HistoryEvent};

pub const DEFAULT_SESSION_GAP_SECS: f64 = 43_200.0;

/// Wall clock consulted while analyzing a history.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> f64 {
        chrono::Utc::now().timestamp() as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now_unix(&self) -> f64 {
        self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    shots: Vec<f64>,
}

impl Session {
    fn seeded(ts: f64) -> Self {
        Self { shots: vec![ts] }
    }

    pub fn shots(&self) -> &[f64] {
        &self.shots
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segmentation {
    /// Ordered sessions; the last one is the currently open session.
    pub sessions: Vec<Session>,
    /// Longest session reached by extending within the gap. A session opened by a reset
    /// or by a gap-breaking shot only counts once a later shot joins it.
    pub high_score: usize,
    pub active_limit: Option<u32>,
}

impl Segmentation {
    pub fn current(&self) -> Option<&Session> {
        self.sessions.last()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSegmenter {
    gap_secs: f64,
}

impl Default for SessionSegmenter {
    fn default() -> Self {
        Self { gap_secs: DEFAULT_SESSION_GAP_SECS }
    }
}

impl SessionSegmenter {
    pub fn new(gap_secs: f64) -> Self {
        Self { gap_secs }
    }

    pub fn gap_secs(&self) -> f64 {
        self.gap_secs
    }

    /// Single left-to-right pass over `history`.
    ///
    /// The gap clock starts at the first event's legacy code. A limit event moves the gap
    /// clock to `now` (the analysis time) rather than to any event time, so the shot that
    /// follows a limit is measured against the moment of analysis. Any shot that breaks the
    /// gap clears the active limit; only a new limit event sets one again.
    pub fn segment(&self, history: &History, now: f64) -> Segmentation {
        let Some(first) = history.first() else {
            return Segmentation::default();
        };

        let mut prev = first.code();
        let mut sessions = vec![Session::default()];
        let mut high_score = 0;
        let mut active_limit = None;

        for event in history.iter() {
            match *event {
                HistoryEvent::Limit { limit } => {
                    active_limit = Some(limit);
                    prev = now;
                }
                HistoryEvent::Shot { ts } if ts != RESET_CODE && ts - prev <= self.gap_secs => {
                    if let Some(open) = sessions.last_mut() {
                        open.shots.push(ts);
                        high_score = high_score.max(open.len());
                    }
                    prev = ts;
                }
                HistoryEvent::Shot { ts } if ts != RESET_CODE => {
                    active_limit = None;
                    sessions.push(Session::seeded(ts));
                    prev = ts;
                }
                // A zero timestamp reads back as a reset marker.
                HistoryEvent::Shot { .. } | HistoryEvent::Reset => {
                    active_limit = None;
                    sessions.push(Session::default());
                    prev = RESET_CODE;
                }
            }
        }

        Segmentation { sessions, high_score, active_limit }
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, Session, SessionSegmenter, SystemClock};
    use crate::codec::decode;

    const T1: f64 = 1_730_000_000.0;

    fn lengths(codes: &[f64], now: f64) -> Vec<usize> {
        SessionSegmenter::default()
            .segment(&decode(codes), now)
            .sessions
            .iter()
            .map(Session::len)
            .collect()
    }

    #[test]
    fn empty_history_yields_no_sessions_and_no_limit() {
        let segmentation = SessionSegmenter::default().segment(&decode(&[]), T1);
        assert!(segmentation.sessions.is_empty());
        assert_eq!(segmentation.active_limit, None);
        assert!(segmentation.current().is_none());
    }

    #[test]
    fn shots_within_gap_share_a_session() {
        assert_eq!(lengths(&[T1, T1 + 43_200.0], T1), vec![2]);
    }

    #[test]
    fn gap_beyond_twelve_hours_opens_seeded_session() {
        let segmentation = SessionSegmenter::default().segment(&decode(&[T1, T1 + 50_000.0]), T1);
        assert_eq!(segmentation.sessions.len(), 2);
        assert_eq!(segmentation.sessions[1].shots(), &[T1 + 50_000.0]);
    }

    #[test]
    fn gap_break_clears_earlier_limit() {
        let segmentation =
            SessionSegmenter::default().segment(&decode(&[-5.0, T1, T1 + 50_000.0]), T1);
        assert_eq!(segmentation.active_limit, None);
    }

    #[test]
    fn limit_survives_shots_inside_the_session() {
        let segmentation = SessionSegmenter::default().segment(&decode(&[-5.0, T1]), T1 + 60.0);
        assert_eq!(segmentation.active_limit, Some(5));
        assert_eq!(segmentation.current().map(Session::len), Some(1));
    }

    #[test]
    fn limit_measures_next_gap_against_analysis_time() {
        // The shot is only 60s after the previous one, but the limit moved the gap clock to
        // `now`, which is far in the past relative to the shot.
        let now = T1 - 100_000.0;
        let segmentation =
            SessionSegmenter::default().segment(&decode(&[T1, -3.0, T1 + 60.0]), now);
        assert_eq!(segmentation.sessions.len(), 2);
        assert_eq!(segmentation.active_limit, None);

        // Analysed close to the shot, the same history keeps one session and the limit.
        let segmentation =
            SessionSegmenter::default().segment(&decode(&[T1, -3.0, T1 + 60.0]), T1 + 120.0);
        assert_eq!(segmentation.sessions.len(), 1);
        assert_eq!(segmentation.active_limit, Some(3));
    }

    #[test]
    fn reset_opens_empty_session_and_next_shot_seeds_another() {
        assert_eq!(lengths(&[T1, T1 + 10.0, 0.0], T1), vec![2, 0]);
        assert_eq!(lengths(&[T1, T1 + 10.0, 0.0, T1 + 20.0, T1 + 30.0], T1), vec![2, 0, 2]);
    }

    #[test]
    fn reset_clears_limit() {
        let segmentation = SessionSegmenter::default().segment(&decode(&[-4.0, T1, 0.0]), T1);
        assert_eq!(segmentation.active_limit, None);
    }

    #[test]
    fn leading_reset_starts_gap_clock_at_zero() {
        assert_eq!(lengths(&[0.0, T1], T1), vec![0, 0, 1]);
    }

    #[test]
    fn high_score_tracks_only_sessions_extended_within_the_gap() {
        let segmenter = SessionSegmenter::default();

        assert_eq!(segmenter.segment(&decode(&[0.0, T1]), T1).high_score, 0);
        assert_eq!(segmenter.segment(&decode(&[0.0, T1, 0.0, T1 + 100.0]), T1).high_score, 0);
        assert_eq!(segmenter.segment(&decode(&[T1, T1 + 50_000.0]), T1).high_score, 1);
        assert_eq!(
            segmenter.segment(&decode(&[0.0, T1, T1 + 60.0, T1 + 120.0]), T1).high_score,
            3
        );
    }

    #[test]
    fn system_clock_reads_current_unix_time() {
        let before = chrono::Utc::now().timestamp() as f64;
        let now = SystemClock.now_unix();
        let after = chrono::Utc::now().timestamp() as f64;
        assert!(now >= before && now <= after, "{before} <= {now} <= {after}");
    }

    #[test]
    fn custom_gap_is_respected() {
        let segmenter = SessionSegmenter::new(60.0);
        let segmentation = segmenter.segment(&decode(&[T1, T1 + 60.0, T1 + 121.0]), T1);
        let lengths: Vec<usize> = segmentation.sessions.iter().map(Session::len).collect();
        assert_eq!(lengths, vec![2, 1]);
        assert_eq!(segmenter.gap_secs(), 60.0);
    }
}
