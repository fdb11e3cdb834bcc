//! In-memory job record store for tests and local runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use broll_models::{JobId, JobRecord, JobStatus};

use crate::error::{StoreError, StoreResult};
use crate::JobStore;

/// Job record store backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryJobStore {
    records: Mutex<HashMap<String, JobRecord>>,
    /// Every status observed per job, in write order. Lets tests assert
    /// the status sequence is a legal prefix.
    history: Mutex<HashMap<String, Vec<JobStatus>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed status sequence for a job, in write order.
    pub fn status_history(&self, id: &JobId) -> Vec<JobStatus> {
        self.history
            .lock()
            .expect("store lock poisoned")
            .get(id.as_str())
            .cloned()
            .unwrap_or_default()
    }

    fn store(&self, record: JobRecord) {
        self.history
            .lock()
            .expect("store lock poisoned")
            .entry(record.id.as_str().to_string())
            .or_default()
            .push(record.status);
        self.records
            .lock()
            .expect("store lock poisoned")
            .insert(record.id.as_str().to_string(), record);
    }

    fn load(&self, id: &JobId) -> StoreResult<JobRecord> {
        self.records
            .lock()
            .expect("store lock poisoned")
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put(&self, record: &JobRecord) -> StoreResult<()> {
        self.store(record.clone());
        Ok(())
    }

    async fn get(&self, id: &JobId) -> StoreResult<Option<JobRecord>> {
        Ok(self
            .records
            .lock()
            .expect("store lock poisoned")
            .get(id.as_str())
            .cloned())
    }

    async fn get_by_task(&self, task_id: &str) -> StoreResult<Option<JobRecord>> {
        Ok(self
            .records
            .lock()
            .expect("store lock poisoned")
            .values()
            .find(|r| r.task_id.as_deref() == Some(task_id))
            .cloned())
    }

    async fn mark_processing(&self, id: &JobId) -> StoreResult<()> {
        let record = self.load(id)?;
        let record = match record.status {
            JobStatus::Pending => record.start()?,
            _ => record.begin_run(),
        };
        self.store(record);
        Ok(())
    }

    async fn mark_completed(&self, id: &JobId, output_url: &str) -> StoreResult<()> {
        let record = self.load(id)?.complete(output_url)?;
        self.store(record);
        Ok(())
    }

    async fn mark_failed(&self, id: &JobId, error: &str) -> StoreResult<()> {
        let record = self.load(id)?.fail(error)?;
        self.store(record);
        Ok(())
    }
}
