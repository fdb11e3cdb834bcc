//! Job executor.
//!
//! Pulls deliveries from the stream, runs the pipeline under a
//! concurrency cap, and acks every delivery once its terminal status
//! has been written. There is no retry layer: a failed job is acked
//! too, its `Failed` record is the outcome. Redelivery only happens
//! when a worker dies mid-job, in which case the periodic claim loop
//! picks the delivery up and the pipeline fully replaces the job state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use broll_queue::{JobQueue, ProcessVideoJob};

use crate::config::WorkerConfig;
use crate::error::PipelineResult;
use crate::pipeline::{process_video, PipelineContext};

/// Job executor that processes deliveries from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    ctx: Arc<PipelineContext>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, queue: JobQueue, ctx: Arc<PipelineContext>) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            config,
            queue: Arc::new(queue),
            ctx,
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Start the executor.
    pub async fn run(&self) -> PipelineResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claim_loop();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        // Back off on error
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Job executor stopped");
        Ok(())
    }

    /// Periodically claim deliveries abandoned by dead workers.
    fn spawn_claim_loop(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let claim_interval = self.config.claim_interval;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue.claim_pending(&consumer_name, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("Claimed {} pending deliveries", jobs.len());
                                for (message_id, job) in jobs {
                                    let ctx = Arc::clone(&ctx);
                                    let queue = Arc::clone(&queue);
                                    let Ok(permit) = semaphore.clone().acquire_owned().await else {
                                        break;
                                    };
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(ctx, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to claim pending deliveries: {}", e);
                            }
                        }
                    }
                }
            }
        })
    }

    /// Consume and dispatch deliveries from the queue.
    async fn consume_jobs(&self) -> PipelineResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            // All slots busy, wait a bit
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} deliveries from queue", jobs.len());

        for (message_id, job) in jobs {
            let ctx = Arc::clone(&self.ctx);
            let queue = Arc::clone(&self.queue);
            let Ok(permit) = self.job_semaphore.clone().acquire_owned().await else {
                break;
            };
            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(ctx, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Run one delivery and ack it.
    ///
    /// The ack happens for failures too: by this point the job record
    /// already carries its terminal status, so redelivering the message
    /// would add nothing.
    async fn execute_job(
        ctx: Arc<PipelineContext>,
        queue: Arc<JobQueue>,
        message_id: String,
        job: ProcessVideoJob,
    ) {
        let job_id = job.job_id.clone();
        info!("Executing job {}", job_id);

        match process_video(&ctx, &job).await {
            Ok(output_url) => {
                info!("Job {} completed: {}", job_id, output_url);
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
            }
        }

        if let Err(e) = queue.ack(&message_id).await {
            error!("Failed to ack delivery for job {}: {}", job_id, e);
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
