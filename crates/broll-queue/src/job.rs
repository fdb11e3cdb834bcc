//! Queue job payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use broll_models::JobId;

/// Work order for one enrichment job.
///
/// The `job_id` ties the delivery back to the persisted [`broll_models::JobRecord`];
/// everything the worker needs to run the pipeline rides in the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessVideoJob {
    /// Job record ID
    pub job_id: JobId,
    /// Owning user
    pub user_id: String,
    /// Source video URL
    pub video_url: String,
    /// Free-text prompt submitted with the job
    pub prompt: String,
    /// Optional b-roll style hint from the variant entry point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// When the job was enqueued
    pub created_at: DateTime<Utc>,
}

impl ProcessVideoJob {
    pub fn new(
        job_id: JobId,
        user_id: impl Into<String>,
        video_url: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            user_id: user_id.into(),
            video_url: video_url.into(),
            prompt: prompt.into(),
            style: None,
            created_at: Utc::now(),
        }
    }

    /// Set the style hint.
    pub fn with_style(mut self, style: Option<String>) -> Self {
        self.style = style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let job = ProcessVideoJob::new(
            JobId::from_string("job-1"),
            "user123",
            "https://example.com/v.mp4",
            "B-roll generation",
        )
        .with_style(Some("default".to_string()));

        let raw = serde_json::to_string(&job).unwrap();
        let parsed: ProcessVideoJob = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.job_id.as_str(), "job-1");
        assert_eq!(parsed.style.as_deref(), Some("default"));
    }

    #[test]
    fn style_is_omitted_when_unset() {
        let job = ProcessVideoJob::new(
            JobId::from_string("job-1"),
            "user123",
            "https://example.com/v.mp4",
            "prompt",
        );
        let raw = serde_json::to_string(&job).unwrap();
        assert!(!raw.contains("style"));
    }
}
