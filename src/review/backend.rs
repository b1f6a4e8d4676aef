use async_trait::async_trait;
use serde_json::Value;

use super::state::ProjectId;
use crate::errors::ReviewError;

/// Comment used when the review response body cannot be read as JSON at all.
pub const NO_DATA_COMMENT: &str = "No data";

/// Parsed result of a review operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReport {
    /// Completion percentage, clamped to `0..=100`.
    pub percent: u8,
    pub comment: String,
}

impl ReviewReport {
    pub fn new(percent: u8, comment: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            comment: comment.into(),
        }
    }

    /// Read `percent` and `comment` out of a JSON object.
    ///
    /// Missing or malformed fields never fail the review: the percentage
    /// defaults to 0 and the comment to an empty string.
    pub fn from_value(value: &Value) -> Self {
        Self {
            percent: parse_percent(value.get("percent")),
            comment: parse_comment(value.get("comment")),
        }
    }

    /// Parse a raw response body. A body that is not JSON yields 0% and
    /// [`NO_DATA_COMMENT`].
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::new(0, NO_DATA_COMMENT),
        }
    }
}

fn parse_percent(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(p) if p.is_finite() => p.clamp(0.0, 100.0).round() as u8,
        _ => 0,
    }
}

fn parse_comment(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The real, server-side review operation.
///
/// Implementations must be cancel-safe: the orchestrator aborts a review by
/// dropping the returned future.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    async fn review(&self, project_id: ProjectId) -> Result<ReviewReport, ReviewError>;
}

/// Calls `POST {base_url}/ai/review/{project_id}`.
#[derive(Debug, Clone)]
pub struct HttpReviewBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReviewBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn review_url(&self, project_id: ProjectId) -> String {
        format!(
            "{}/ai/review/{}",
            self.base_url.trim_end_matches('/'),
            project_id
        )
    }
}

#[async_trait]
impl ReviewBackend for HttpReviewBackend {
    async fn review(&self, project_id: ProjectId) -> Result<ReviewReport, ReviewError> {
        let resp = self.client.post(self.review_url(project_id)).send().await?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ReviewError::Decode(e.to_string()))?;

        if !status.is_success() {
            return Err(ReviewError::from_status(status.as_u16(), &body));
        }
        Ok(ReviewReport::from_body(&body))
    }
}
