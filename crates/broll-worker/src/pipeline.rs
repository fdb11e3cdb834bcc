//! Job orchestrator.
//!
//! Runs the full enrichment pipeline for one delivery: fetch source,
//! transcribe, extract keywords, resolve b-roll, generate the edit
//! plan, fetch the referenced clips, assemble, upload. Terminal status
//! is written exactly once per run, and the per-job scratch directory
//! is removed on every exit path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use broll_queue::ProcessVideoJob;
use broll_store::JobStore;
use broll_storage::ObjectStore;

use crate::config::WorkerConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::services::{ClipFetcher, Completion, Composer, FootageSearch, Transcriber};
use crate::{keywords, plan, resolve};

/// Everything a pipeline run needs, with each collaborator behind its
/// trait so tests can swap in fakes.
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub store: Arc<dyn JobStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub completion: Arc<dyn Completion>,
    pub search: Arc<dyn FootageSearch>,
    pub fetcher: Arc<dyn ClipFetcher>,
    pub composer: Arc<dyn Composer>,
}

/// Run the pipeline for one delivery and record the terminal status.
///
/// Returns the public output URL on success. The error path writes
/// `Failed` with the error string and re-raises so the executor can log
/// the failed delivery.
pub async fn process_video(ctx: &PipelineContext, job: &ProcessVideoJob) -> PipelineResult<String> {
    info!("job {} started for user {}", job.job_id, job.user_id);
    ctx.store.mark_processing(&job.job_id).await?;

    // Everything after the Processing write runs inside this match so
    // any abort, scratch setup included, lands in the Failed arm.
    match run_in_scratch(ctx, job).await {
        Ok(output_url) => {
            ctx.store.mark_completed(&job.job_id, &output_url).await?;
            info!("job {} completed: {}", job.job_id, output_url);
            Ok(output_url)
        }
        Err(err) => {
            error!("job {} failed: {}", job.job_id, err);
            ctx.store.mark_failed(&job.job_id, &err.to_string()).await?;
            Err(err)
        }
    }
}

/// Set up the per-job scratch directory and run the stages in it.
async fn run_in_scratch(ctx: &PipelineContext, job: &ProcessVideoJob) -> PipelineResult<String> {
    tokio::fs::create_dir_all(&ctx.config.work_dir).await?;
    // TempDir removes the scratch tree when dropped, covering both the
    // success and the failure return.
    let scratch = tempfile::Builder::new()
        .prefix(&format!("job-{}-", job.job_id))
        .tempdir_in(&ctx.config.work_dir)?;

    run_stages(ctx, job, scratch.path()).await
}

async fn run_stages(
    ctx: &PipelineContext,
    job: &ProcessVideoJob,
    scratch: &Path,
) -> PipelineResult<String> {
    let main_path = scratch.join("source.mp4");
    ctx.fetcher.fetch(&job.video_url, &main_path).await?;

    let transcript = ctx.transcriber.transcribe(&main_path).await?;
    info!("job {} transcribed, {} chars", job.job_id, transcript.len());

    let candidates = keywords::extract(ctx.completion.as_ref(), &transcript).await?;
    let clips = resolve::resolve_broll(ctx.search.as_ref(), &candidates).await?;
    let plan = plan::generate(ctx.completion.as_ref(), &transcript, &clips).await?;
    info!(
        "job {} planned {} insertions from {} clips",
        job.job_id,
        plan.len(),
        clips.len()
    );

    // Download only the clips the plan actually references, once each.
    let sources: HashMap<&str, &str> = clips
        .iter()
        .map(|c| (c.keyword.as_str(), c.source_url.as_str()))
        .collect();
    let mut broll: HashMap<String, PathBuf> = HashMap::new();
    for (i, instruction) in plan.instructions().iter().enumerate() {
        if broll.contains_key(&instruction.clip_id) {
            continue;
        }
        let url = sources
            .get(instruction.clip_id.as_str())
            .ok_or_else(|| PipelineError::MissingClip(instruction.clip_id.clone()))?;
        let dest = scratch.join(format!("broll_{}.mp4", i));
        ctx.fetcher.fetch(url, &dest).await?;
        broll.insert(instruction.clip_id.clone(), dest);
    }

    let output_path = scratch.join("output.mp4");
    ctx.composer
        .assemble(&main_path, &broll, &plan, &output_path)
        .await?;

    let key = format!("output/{}.mp4", job.job_id);
    ctx.storage.put_file(&key, &output_path).await?;
    Ok(ctx.storage.public_url(&key))
}
