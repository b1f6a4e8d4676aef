use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Project identifier used to address all per-project review state.
pub type ProjectId = i64;

/// Marker shown when an operator cancels a review.
pub const CANCELLED_MESSAGE: &str = "Cancelled";

/// Fallback shown when a failed review carries no message of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "Review request failed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ReviewPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal phases are treated as idle when a new review is started.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ReviewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid review phase: {}", s)),
        }
    }
}

/// Display snapshot of one project's review.
///
/// Fields are private so the only way to build a state is through the
/// per-phase constructors: `comment` exists only on `Completed`,
/// `error_message` only on `Failed`/`Cancelled`, and `progress` is always
/// within `0..=100`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReviewState")]
pub struct ReviewState {
    phase: ReviewPhase,
    progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, rename = "error", skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl ReviewState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn running(progress: u8) -> Self {
        Self {
            phase: ReviewPhase::Running,
            progress: progress.min(100),
            comment: None,
            error_message: None,
        }
    }

    pub fn completed(progress: u8, comment: impl Into<String>) -> Self {
        Self {
            phase: ReviewPhase::Completed,
            progress: progress.min(100),
            comment: Some(comment.into()),
            error_message: None,
        }
    }

    /// A failed review. Blank messages are replaced with
    /// [`FALLBACK_ERROR_MESSAGE`].
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            phase: ReviewPhase::Failed,
            progress: 0,
            comment: None,
            error_message: Some(message),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            phase: ReviewPhase::Cancelled,
            progress: 0,
            comment: None,
            error_message: Some(CANCELLED_MESSAGE.to_string()),
        }
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.phase == ReviewPhase::Running
    }

    /// Raise the displayed progress of a running review. Never lowers it.
    pub(crate) fn raise_progress(&mut self, value: u8) {
        debug_assert!(self.is_running());
        self.progress = self.progress.max(value.min(100));
    }
}

/// Wire shape of [`ReviewState`]; checked before it becomes one.
#[derive(Deserialize)]
struct RawReviewState {
    phase: ReviewPhase,
    #[serde(default)]
    progress: u8,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default, rename = "error")]
    error_message: Option<String>,
}

impl TryFrom<RawReviewState> for ReviewState {
    type Error = String;

    fn try_from(raw: RawReviewState) -> Result<Self, Self::Error> {
        let phase = raw.phase;
        if raw.progress > 100 {
            return Err(format!("progress {} is out of range", raw.progress));
        }
        if raw.comment.is_some() && phase != ReviewPhase::Completed {
            return Err(format!("a {} review has no comment", phase));
        }
        let may_carry_error = matches!(phase, ReviewPhase::Failed | ReviewPhase::Cancelled);
        if raw.error_message.is_some() && !may_carry_error {
            return Err(format!("a {} review has no error", phase));
        }
        let progress_allowed = matches!(phase, ReviewPhase::Running | ReviewPhase::Completed);
        if raw.progress != 0 && !progress_allowed {
            return Err(format!("a {} review is always at 0%", phase));
        }

        Ok(match phase {
            ReviewPhase::Idle => Self::idle(),
            ReviewPhase::Running => Self::running(raw.progress),
            ReviewPhase::Completed => {
                Self::completed(raw.progress, raw.comment.unwrap_or_default())
            }
            ReviewPhase::Failed => Self::failed(raw.error_message.unwrap_or_default()),
            ReviewPhase::Cancelled => Self::cancelled(),
        })
    }
}

/// A state change published by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub project_id: ProjectId,
    pub state: ReviewState,
    pub at: chrono::DateTime<chrono::Utc>,
    /// Registry revision this change produced; strictly increasing per controller.
    #[serde(default)]
    pub revision: u64,
}

impl ReviewEvent {
    pub fn new(project_id: ProjectId, state: ReviewState) -> Self {
        Self {
            project_id,
            state,
            at: chrono::Utc::now(),
            revision: 0,
        }
    }

    pub(crate) fn at_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Whether this change is missing from a snapshot taken at `revision`.
    pub fn is_newer_than(&self, revision: u64) -> bool {
        self.revision > revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trips_through_str() {
        for phase in [
            ReviewPhase::Idle,
            ReviewPhase::Running,
            ReviewPhase::Completed,
            ReviewPhase::Failed,
            ReviewPhase::Cancelled,
        ] {
            assert_eq!(phase.as_str().parse::<ReviewPhase>().unwrap(), phase);
        }
        assert!("paused".parse::<ReviewPhase>().is_err());
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = ReviewState::default();
        assert_eq!(state.phase(), ReviewPhase::Idle);
        assert_eq!(state.progress(), 0);
        assert!(state.comment().is_none());
        assert!(state.error_message().is_none());
    }

    #[test]
    fn test_constructors_clamp_progress() {
        assert_eq!(ReviewState::running(250).progress(), 100);
        assert_eq!(ReviewState::completed(101, "ok").progress(), 100);
    }

    #[test]
    fn test_comment_and_error_are_exclusive() {
        let done = ReviewState::completed(87, "Looks solid");
        assert_eq!(done.comment(), Some("Looks solid"));
        assert!(done.error_message().is_none());

        let failed = ReviewState::failed("network down");
        assert_eq!(failed.error_message(), Some("network down"));
        assert!(failed.comment().is_none());
        assert_eq!(failed.progress(), 0);

        let cancelled = ReviewState::cancelled();
        assert_eq!(cancelled.error_message(), Some(CANCELLED_MESSAGE));
        assert!(cancelled.comment().is_none());
    }

    #[test]
    fn test_failed_with_blank_message_uses_fallback() {
        let state = ReviewState::failed("   ");
        assert_eq!(state.error_message(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[test]
    fn test_raise_progress_never_lowers() {
        let mut state = ReviewState::running(40);
        state.raise_progress(30);
        assert_eq!(state.progress(), 40);
        state.raise_progress(55);
        assert_eq!(state.progress(), 55);
    }

    #[test]
    fn test_state_serialization_uses_error_key() {
        let json = serde_json::to_value(ReviewState::failed("boom")).unwrap();
        assert_eq!(json["phase"], "failed");
        assert_eq!(json["error"], "boom");
        assert!(json.get("comment").is_none());
    }

    #[test]
    fn test_state_deserializes_through_constructors() {
        let json = serde_json::to_string(&ReviewState::completed(87, "Looks solid")).unwrap();
        let back: ReviewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReviewState::completed(87, "Looks solid"));

        let failed: ReviewState =
            serde_json::from_str(r#"{"phase":"failed","progress":0,"error":""}"#).unwrap();
        assert_eq!(failed.error_message(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[test]
    fn test_state_rejects_inconsistent_json() {
        for bad in [
            r#"{"phase":"failed","progress":200,"comment":"x"}"#,
            r#"{"phase":"running","progress":101}"#,
            r#"{"phase":"failed","progress":40,"error":"boom"}"#,
            r#"{"phase":"running","progress":10,"error":"boom"}"#,
            r#"{"phase":"cancelled","progress":0,"comment":"x"}"#,
        ] {
            assert!(serde_json::from_str::<ReviewState>(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!ReviewPhase::Idle.is_terminal());
        assert!(!ReviewPhase::Running.is_terminal());
        assert!(ReviewPhase::Completed.is_terminal());
        assert!(ReviewPhase::Failed.is_terminal());
        assert!(ReviewPhase::Cancelled.is_terminal());
    }
}
