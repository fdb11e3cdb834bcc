//! Redis-backed job record store.
//!
//! One JSON document per job under `broll:job:{id}`, plus a pointer
//! key `broll:task:{task_id}` for the task-status query. Redis executes
//! commands for a key serially, and every mutation goes through the
//! typed transitions, so concurrent same-job writes cannot interleave
//! into an illegal status sequence.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use broll_models::{JobId, JobRecord, JobStatus};

use crate::error::StoreResult;
use crate::{JobStore, StoreError};

const JOB_KEY_PREFIX: &str = "broll:job:";
const TASK_KEY_PREFIX: &str = "broll:task:";

/// Job record store on Redis.
pub struct RedisJobStore {
    client: redis::Client,
}

impl RedisJobStore {
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> StoreResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    fn job_key(id: &JobId) -> String {
        format!("{}{}", JOB_KEY_PREFIX, id)
    }

    fn task_key(task_id: &str) -> String {
        format!("{}{}", TASK_KEY_PREFIX, task_id)
    }

    async fn write(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        record: &JobRecord,
    ) -> StoreResult<()> {
        let payload = serde_json::to_string(record)?;
        conn.set::<_, _, ()>(Self::job_key(&record.id), payload).await?;
        if let Some(task_id) = &record.task_id {
            conn.set::<_, _, ()>(Self::task_key(task_id), record.id.as_str())
                .await?;
        }
        Ok(())
    }

    async fn load(&self, id: &JobId) -> StoreResult<JobRecord> {
        self.get(id).await?.ok_or_else(|| StoreError::not_found(id.as_str()))
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn put(&self, record: &JobRecord) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        self.write(&mut conn, record).await?;
        debug!("Stored job record {} ({})", record.id, record.status);
        Ok(())
    }

    async fn get(&self, id: &JobId) -> StoreResult<Option<JobRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::job_key(id)).await?;
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn get_by_task(&self, task_id: &str) -> StoreResult<Option<JobRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let job_id: Option<String> = conn.get(Self::task_key(task_id)).await?;
        match job_id {
            Some(id) => self.get(&JobId::from_string(id)).await,
            None => Ok(None),
        }
    }

    async fn mark_processing(&self, id: &JobId) -> StoreResult<()> {
        let record = self.load(id).await?;
        let record = match record.status {
            JobStatus::Pending => record.start()?,
            // Redelivered job: the run fully replaces prior state.
            _ => record.begin_run(),
        };
        self.put(&record).await
    }

    async fn mark_completed(&self, id: &JobId, output_url: &str) -> StoreResult<()> {
        let record = self.load(id).await?.complete(output_url)?;
        self.put(&record).await
    }

    async fn mark_failed(&self, id: &JobId, error: &str) -> StoreResult<()> {
        let record = self.load(id).await?.fail(error)?;
        self.put(&record).await
    }
}
