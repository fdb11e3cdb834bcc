//! Streaming HTTP download of remote video files.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::services::ClipFetcher;

/// Downloads remote videos to local scratch storage over HTTP.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::config_error(format!("http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ClipFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> PipelineResult<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::upstream(format!("download of {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::upstream(format!(
                "download of {} returned {}",
                url,
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| PipelineError::upstream(format!("download of {} interrupted: {}", url, e)))?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("downloaded {} bytes to {}", written, dest.display());
        Ok(())
    }
}
