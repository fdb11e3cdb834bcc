//! Job record store.
//!
//! The orchestrator and the API talk to job records through the
//! [`JobStore`] trait so either can be handed a fake in tests. The
//! Redis implementation is the production store; [`MemoryJobStore`]
//! backs tests and local single-process runs.
//!
//! All mutation goes through the typed transitions on
//! [`broll_models::JobRecord`], so a stale or duplicate write can never
//! regress a job out of a terminal state.

mod error;
mod memory;
mod redis_store;

use async_trait::async_trait;

use broll_models::{JobId, JobRecord};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryJobStore;
pub use redis_store::RedisJobStore;

/// Upsert-by-id job record store.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace a record.
    async fn put(&self, record: &JobRecord) -> StoreResult<()>;

    /// Fetch a record by job ID.
    async fn get(&self, id: &JobId) -> StoreResult<Option<JobRecord>>;

    /// Fetch a record by its queue task ID.
    async fn get_by_task(&self, task_id: &str) -> StoreResult<Option<JobRecord>>;

    /// Transition a job to `Processing`.
    async fn mark_processing(&self, id: &JobId) -> StoreResult<()>;

    /// Transition a job to `Completed` and set the output URL in the
    /// same write.
    async fn mark_completed(&self, id: &JobId, output_url: &str) -> StoreResult<()>;

    /// Transition a job to `Failed` and record the error string.
    async fn mark_failed(&self, id: &JobId, error: &str) -> StoreResult<()>;
}
