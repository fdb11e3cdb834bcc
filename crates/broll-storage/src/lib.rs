//! Object storage for output artifacts.
//!
//! The pipeline uploads the assembled video and hands back a public
//! URL. Storage sits behind the [`ObjectStore`] trait so the worker can
//! be tested without a bucket.

mod client;
mod error;

use std::path::Path;

use async_trait::async_trait;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};

/// Artifact storage the orchestrator writes to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`.
    async fn put_file(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Public URL for an uploaded key.
    fn public_url(&self, key: &str) -> String;
}
