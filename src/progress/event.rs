//! Event schema for run progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One progress report. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Percent is clamped to 100.
    pub fn now(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Latest status of a session as served to pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub progress: u8,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressSnapshot {
    pub fn not_found() -> Self {
        Self {
            progress: 0,
            status: "Session not found".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn starting() -> Self {
        Self {
            progress: 0,
            status: "Starting...".to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&ProgressEvent> for ProgressSnapshot {
    fn from(event: &ProgressEvent) -> Self {
        Self {
            progress: event.percent,
            status: event.message.clone(),
            timestamp: event.timestamp,
        }
    }
}
