//! Progress events published by the engines

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single progress update.
///
/// `total == 0` means the total is unknown, not that there is no work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: i64,
    pub total: i64,
    pub message: String,
}

impl Progress {
    pub fn new(current: i64, total: i64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }

    /// Event with an unknown total
    pub fn unbounded(current: i64, message: impl Into<String>) -> Self {
        Self::new(current, 0, message)
    }

    /// Whether the total is known
    pub fn has_total(&self) -> bool {
        self.total > 0
    }

    /// Completion percentage, if the total is known
    pub fn percent(&self) -> Option<u8> {
        if !self.has_total() {
            return None;
        }
        let pct = (self.current.max(0) as f64 / self.total as f64 * 100.0).min(100.0);
        Some(pct as u8)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(pct) => write!(f, "[{:>3}%] {}", pct, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
