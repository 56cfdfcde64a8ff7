//! Generation Queue Client — the single point of contact with the external
//! asynchronous generation worker.
//!
//! ARCHITECTURAL RULE: no other module talks to the queue API directly.
//! Submission and polling both go through the `GenerationQueue` trait so the
//! per-segment driver in `worker.rs` can be tested against a mock queue.

pub mod worker;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::segment::SegmentType;

// ────────────────────────────────────────────────────────────────────────────
// Wire contract
// ────────────────────────────────────────────────────────────────────────────

/// Named transform requested against existing segment content, as opposed to
/// first-time generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementAction {
    Improve,
    Expand,
    Rewrite,
    Optimize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// First-time generation for a segment.
    AiOptimize,
    /// Enhancement of existing content.
    AiEnhance,
}

/// The minimal context the worker needs to (re)generate one segment type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub segment_type: SegmentType,
    pub candidate_id: Uuid,
    pub language: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancement_action: Option<EnhancementAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_html: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub payload: JobPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueResponse {
    job_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub content: Option<String>,
    pub html_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub status: JobState,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Queue-side error taxonomy. `TimedOut` is deliberately distinct from
/// `JobFailed`: an explicit worker failure and an abandoned wait surface
/// differently in logs even though both land the segment in `error`.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("enqueue rejected (status {status}): {message}")]
    EnqueueFailed { status: u16, message: String },

    #[error("enqueue response carried no job handle")]
    MissingJobHandle,

    #[error("generation job failed: {0}")]
    JobFailed(String),

    #[error("no terminal job state within {waited:?}")]
    TimedOut { waited: Duration },

    #[error("queue transport error: {0}")]
    Http(#[from] reqwest::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait + HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

/// Submission and polling seam. `AppState` holds an `Arc<dyn GenerationQueue>`;
/// worker tests swap in a scripted mock.
#[async_trait]
pub trait GenerationQueue: Send + Sync {
    /// Submits one generation/enhancement job, returning the job handle.
    async fn enqueue(&self, request: &EnqueueRequest) -> Result<String, QueueError>;

    /// Fetches the current status of a previously enqueued job.
    async fn poll(&self, job_id: &str) -> Result<JobStatusResponse, QueueError>;
}

/// The production client: plain HTTP against the queue API.
#[derive(Clone)]
pub struct HttpQueueClient {
    client: Client,
    base_url: String,
}

impl HttpQueueClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GenerationQueue for HttpQueueClient {
    async fn enqueue(&self, request: &EnqueueRequest) -> Result<String, QueueError> {
        let url = format!("{}/jobs", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueueError::EnqueueFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body: EnqueueResponse = response.json().await?;
        let job_id = body.job_id.ok_or(QueueError::MissingJobHandle)?;
        debug!("enqueued generation job {job_id}");
        Ok(job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatusResponse, QueueError> {
        let url = format!("{}/jobs/{job_id}", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueueError::EnqueueFailed {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_request_wire_shape() {
        let request = EnqueueRequest {
            kind: JobKind::AiEnhance,
            payload: JobPayload {
                segment_type: SegmentType::Summary,
                candidate_id: Uuid::nil(),
                language: "en".to_string(),
                order: 1,
                enhancement_action: Some(EnhancementAction::Improve),
                existing_content: Some("old".to_string()),
                existing_html: None,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "ai_enhance");
        assert_eq!(value["payload"]["segmentType"], "summary");
        assert_eq!(value["payload"]["enhancementAction"], "improve");
        assert_eq!(value["payload"]["existingContent"], "old");
        assert!(
            value["payload"].get("existingHtml").is_none(),
            "absent optional fields must not serialize"
        );
    }

    #[test]
    fn test_job_status_response_parses_completed_result() {
        let json = r#"{
            "status": "completed",
            "result": { "content": "text", "htmlContent": "<p>text</p>" }
        }"#;
        let parsed: JobStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, JobState::Completed);
        let result = parsed.result.unwrap();
        assert_eq!(result.content.as_deref(), Some("text"));
        assert_eq!(result.html_content.as_deref(), Some("<p>text</p>"));
    }

    #[test]
    fn test_job_status_response_parses_failure() {
        let json = r#"{ "status": "failed", "error": "model unavailable" }"#;
        let parsed: JobStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, JobState::Failed);
        assert_eq!(parsed.error.as_deref(), Some("model unavailable"));
    }

    #[test]
    fn test_missing_job_id_is_detectable() {
        let body: EnqueueResponse = serde_json::from_str("{}").unwrap();
        assert!(body.job_id.is_none());
    }
}
