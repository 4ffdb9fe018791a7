//! Shotbot core - history codec, session segmentation and scoring.
//!
//! Everything in this crate is transport and storage agnostic. A user's history is a
//! typed sequence of [`HistoryEvent`]s; the legacy signed-number encoding only exists in
//! [`codec`] so storage adapters can translate at the boundary.

pub mod codec;
pub mod config;
pub mod domain;
pub mod errors;
pub mod guard;
pub mod identity;
pub mod leaderboard;
pub mod locks;
pub mod scoring;
pub mod session;

pub use domain::history::{History, HistoryEvent, UserId};
pub use domain::user::{UserHistory, UserRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use guard::DuplicateGuard;
pub use identity::{IdentityError, IdentityResolver};
pub use leaderboard::{LeaderboardEntry, LeaderboardRanker};
pub use locks::UserLocks;
pub use scoring::{LimitStatus, ScoreCard, ScoringEngine};
pub use session::{Clock, FixedClock, Segmentation, Session, SessionSegmenter, SystemClock};
