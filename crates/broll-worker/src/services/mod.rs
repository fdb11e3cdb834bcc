//! External service seams.
//!
//! Every collaborator the pipeline talks to sits behind a trait so the
//! orchestrator can be driven by fakes in tests. The production
//! implementations live in the submodules.

pub mod composer;
pub mod fetcher;
pub mod openai;
pub mod pexels;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use broll_models::EditPlan;

use crate::error::PipelineResult;

pub use composer::FfmpegComposer;
pub use fetcher::HttpFetcher;
pub use openai::OpenAiClient;
pub use pexels::PexelsClient;

/// Speech-to-text engine: local video file in, transcript text out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, video: &Path) -> PipelineResult<String>;
}

/// LLM completion service. Returns raw text that is *expected* to be
/// JSON; callers must decode and validate it.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> PipelineResult<String>;
}

/// One file variant of a stock search result.
#[derive(Debug, Clone)]
pub struct StockFile {
    pub quality: Option<String>,
    pub height: Option<u32>,
    pub url: String,
}

/// Best search hit for one query.
#[derive(Debug, Clone)]
pub struct StockHit {
    pub duration: f64,
    pub files: Vec<StockFile>,
}

/// Stock footage search, limited to one result per query.
#[async_trait]
pub trait FootageSearch: Send + Sync {
    async fn search(&self, query: &str) -> PipelineResult<Option<StockHit>>;
}

/// Downloads a remote video resource to local scratch storage.
#[async_trait]
pub trait ClipFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> PipelineResult<()>;
}

/// Merges the main video with downloaded b-roll per the edit plan.
#[async_trait]
pub trait Composer: Send + Sync {
    async fn assemble(
        &self,
        main: &Path,
        broll: &HashMap<String, PathBuf>,
        plan: &EditPlan,
        output: &Path,
    ) -> PipelineResult<()>;
}
