//! Pipeline error types.
//!
//! Only conditions that abort a job live here. Malformed model output
//! is deliberately absent: it is recovered inside its own stage via the
//! deterministic fallbacks and never crosses a stage boundary (see
//! [`crate::llm_json::ModelResponseError`]).

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network or API failure from any upstream collaborator
    /// (transcription, LLM, stock search, download, upload), including
    /// bounded-timeout expiry.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// The committed edit plan references a clip that was never
    /// downloaded. Not recoverable by fallback at this point.
    #[error("Missing b-roll clip for instruction '{0}'")]
    MissingClip(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(#[from] broll_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] broll_storage::StorageError),

    #[error("Store error: {0}")]
    Store(#[from] broll_store::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] broll_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
