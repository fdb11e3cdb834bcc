//! Shared application state.

use std::sync::Arc;

use broll_queue::JobQueue;
use broll_store::{JobStore, RedisJobStore};

use crate::config::ApiConfig;
use crate::error::ApiResult;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn JobStore>,
    pub queue: Arc<JobQueue>,
}

impl AppState {
    /// Wire up production backends from the environment.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let store = Arc::new(RedisJobStore::from_env()?);
        let queue = Arc::new(JobQueue::from_env()?);
        queue.init().await?;

        Ok(Self {
            config,
            store,
            queue,
        })
    }
}
