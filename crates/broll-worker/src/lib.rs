//! B-roll enrichment worker.
//!
//! Consumes enrichment jobs from the stream and runs the pipeline:
//! fetch source, transcribe, extract keywords, resolve stock b-roll,
//! generate an edit plan, assemble with ffmpeg, upload the result.

pub mod config;
pub mod error;
pub mod executor;
pub mod keywords;
pub mod llm_json;
pub mod pipeline;
pub mod plan;
pub mod resolve;
pub mod services;

pub use config::WorkerConfig;
pub use error::{PipelineError, PipelineResult};
pub use executor::JobExecutor;
pub use pipeline::{process_video, PipelineContext};
