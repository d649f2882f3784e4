//! Error types raised by the generator and the external collaborators.

use std::time::Duration;

use thiserror::Error;

/// Level layout could not be produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("level {0} is outside the playable range")]
    InvalidLevel(u32),
}

/// Failures from a progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0:?}")]
    TimedOut(Duration),
}

/// Failures from the rewarded-ad collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdError {
    #[error("no ad available: {0}")]
    Unavailable(String),

    #[error("ad presentation failed: {0}")]
    Failed(String),

    #[error("ad timed out after {0:?}")]
    TimedOut(Duration),
}

/// Failures while preparing level assets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("assets for level {level} are missing")]
    Missing { level: u32 },

    #[error("asset loading failed: {0}")]
    Failed(String),

    #[error("asset loading timed out after {0:?}")]
    TimedOut(Duration),
}

/// Analytics delivery failures (always swallowed by the caller).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("analytics delivery failed: {0}")]
    Delivery(String),
}

/// Tuning file could not be read or is invalid.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Invalid(String),
}
