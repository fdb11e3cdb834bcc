//! B-roll enrichment worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use broll_queue::JobQueue;
use broll_store::RedisJobStore;
use broll_storage::S3Client;
use broll_worker::services::{FfmpegComposer, HttpFetcher, OpenAiClient, PexelsClient};
use broll_worker::{JobExecutor, PipelineContext, PipelineResult, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::from_default_env().add_directive("broll=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting broll-worker");

    if let Err(e) = broll_media::check_tooling() {
        error!("Media tooling check failed: {}", e);
        std::process::exit(1);
    }

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let queue = match JobQueue::from_env() {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = match build_context(config.clone()) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!("Failed to build pipeline context: {}", e);
            std::process::exit(1);
        }
    };

    let executor = Arc::new(JobExecutor::new(config, queue, ctx));

    // Signal handler flips the executor into graceful shutdown
    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

/// Wire the production collaborators into a pipeline context.
fn build_context(config: WorkerConfig) -> PipelineResult<PipelineContext> {
    let timeout = config.upstream_timeout;
    let openai = Arc::new(OpenAiClient::from_env(timeout)?);

    Ok(PipelineContext {
        config,
        store: Arc::new(RedisJobStore::from_env()?),
        storage: Arc::new(S3Client::from_env()?),
        transcriber: openai.clone(),
        completion: openai,
        search: Arc::new(PexelsClient::from_env(timeout)?),
        fetcher: Arc::new(HttpFetcher::new(timeout)?),
        composer: Arc::new(FfmpegComposer),
    })
}
