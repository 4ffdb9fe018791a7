//! Legacy numeric encoding of a history.
//!
//! Persisted histories are flat arrays of numbers: a positive value is a shot timestamp,
//! a negative value `-n` sets a limit of `n` drinks and `0` is a reset marker. Only storage
//! adapters should need this module; everything else works on [`History`].

use crate::domain::history::{History, HistoryEvent};

pub const RESET_CODE: f64 = 0.0;

pub fn decode_code(code: f64) -> HistoryEvent {
    if code < 0.0 {
        // Truncates toward zero like the integer cast legacy readers applied.
        HistoryEvent::Limit { limit: (-code) as u32 }
    } else if code == RESET_CODE {
        HistoryEvent::Reset
    } else {
        HistoryEvent::Shot { ts: code }
    }
}

pub fn decode(codes: &[f64]) -> History {
    codes.iter().copied().map(decode_code).collect()
}

pub fn encode(history: &History) -> Vec<f64> {
    history.iter().map(HistoryEvent::code).collect()
}

pub fn encode_append(mut codes: Vec<f64>, event: HistoryEvent) -> Vec<f64> {
    codes.push(event.code());
    codes
}
