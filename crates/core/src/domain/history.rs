use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store enumeration can hand back records without an identity.
    pub fn is_placeholder(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEvent {
    /// A drink taken at `ts` (Unix epoch seconds, fractional part allowed).
    Shot { ts: f64 },
    /// Sets the active drink limit.
    Limit { limit: u32 },
    /// Session boundary that also clears the active limit.
    Reset,
}

impl HistoryEvent {
    pub fn shot(ts: f64) -> Result<Self, DomainError> {
        if !ts.is_finite() || ts <= 0.0 {
            return Err(DomainError::InvalidTimestamp(ts.to_string()));
        }
        Ok(Self::Shot { ts })
    }

    pub fn limit(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidLimit(value));
        }
        let limit = u32::try_from(value).map_err(|_| DomainError::InvalidLimit(value))?;
        Ok(Self::Limit { limit })
    }

    /// Legacy numeric code: shots are their timestamp, limits are negated, resets are zero.
    pub fn code(&self) -> f64 {
        match self {
            Self::Shot { ts } => *ts,
            Self::Limit { limit } => -f64::from(*limit),
            Self::Reset => 0.0,
        }
    }

    pub fn is_shot(&self) -> bool {
        matches!(self, Self::Shot { .. })
    }
}

/// Append-only event history for one user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    events: Vec<HistoryEvent>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<HistoryEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> Option<&HistoryEvent> {
        self.events.first()
    }

    pub fn push(&mut self, event: HistoryEvent) {
        self.events.push(event);
    }

    pub fn with(mut self, event: HistoryEvent) -> Self {
        self.push(event);
        self
    }

    pub fn shot_count(&self) -> usize {
        self.events.iter().filter(|event| event.is_shot()).count()
    }
}

impl FromIterator<HistoryEvent> for History {
    fn from_iter<I: IntoIterator<Item = HistoryEvent>>(iter: I) -> Self {
        Self { events: iter.into_iter().collect() }
    }
}
