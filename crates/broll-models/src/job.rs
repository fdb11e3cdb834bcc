//! Job identity, status state machine and the persisted job record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an enrichment job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
///
/// The only legal path is `Pending -> Processing -> {Completed, Failed}`.
/// Terminal states have no outgoing transitions and `Processing` cannot
/// be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job accepted, waiting for a worker
    #[default]
    Pending,
    /// A worker is running the pipeline
    Processing,
    /// Pipeline finished, output uploaded
    Completed,
    /// Pipeline aborted, error recorded
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted record of one enrichment job.
///
/// Created at submission, mutated only at stage boundaries by the
/// orchestrator, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job ID
    pub id: JobId,

    /// Owning user
    pub user_id: String,

    /// Free-text prompt submitted with the job
    pub prompt: String,

    /// Source video URL
    pub video_url: String,

    /// Current lifecycle state
    #[serde(default)]
    pub status: JobStatus,

    /// Public URL of the assembled output, set on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,

    /// Failure message, set on failure, retained for inspection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Queue delivery ID for the task-status query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new pending record.
    pub fn new(
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        video_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            user_id: user_id.into(),
            prompt: prompt.into(),
            video_url: video_url.into(),
            status: JobStatus::Pending,
            output_url: None,
            error: None,
            task_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the queue delivery ID.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Begin processing. Rejects the transition from any state other
    /// than `Pending` so a stale write can never regress a job.
    pub fn start(mut self) -> Result<Self, TransitionError> {
        self.transition(JobStatus::Processing)?;
        Ok(self)
    }

    /// Re-enter processing on a redelivered job.
    ///
    /// The task queue is at-least-once, so a job can be handed to a
    /// worker again after a crash or a missed ack. Re-invocation fully
    /// replaces the prior run: status back to `Processing`, output and
    /// error cleared. Within a single run the strict transitions below
    /// still apply.
    pub fn begin_run(mut self) -> Self {
        self.status = JobStatus::Processing;
        self.output_url = None;
        self.error = None;
        self.updated_at = Utc::now();
        self
    }

    /// Mark completed with the output artifact URL. Both fields change
    /// in the same record write.
    pub fn complete(mut self, output_url: impl Into<String>) -> Result<Self, TransitionError> {
        self.transition(JobStatus::Completed)?;
        self.output_url = Some(output_url.into());
        self.error = None;
        Ok(self)
    }

    /// Mark failed with the error string. The output URL stays unset.
    pub fn fail(mut self, error: impl Into<String>) -> Result<Self, TransitionError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error.into());
        Ok(self)
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Rejected job-status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal job transition {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}
