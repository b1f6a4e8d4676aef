//! Typed error hierarchy for taskdeck.
//!
//! Two enums cover the two remote surfaces:
//! - `ReviewError` — the AI review operation; always absorbed into a `ReviewState`
//! - `AdminError` — the admin listing and task-status endpoints

use thiserror::Error;

/// Errors from a review backend. Rendered into the failed state's message.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to read review response: {0}")]
    Decode(String),

    #[error("Review backend panicked: {0}")]
    Panicked(String),
}

impl ReviewError {
    /// Build a `Status` error from an HTTP status and response body, using the
    /// server's `detail` or `error` field when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));
        Self::Status { status, message }
    }
}

impl From<reqwest::Error> for ReviewError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Errors from the admin client.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Admin API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Admin API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid task status '{0}'. Valid values: pending, in_progress, done")]
    InvalidStatus(String),

    #[error("Task {id} not found")]
    TaskNotFound { id: i64 },
}
