//! Pexels stock-footage search client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::services::{FootageSearch, StockFile, StockHit};

const DEFAULT_BASE_URL: &str = "https://api.pexels.com";

/// Pexels video search client.
pub struct PexelsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    duration: f64,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    quality: Option<String>,
    height: Option<u32>,
    link: String,
}

impl PexelsClient {
    /// Create a new client from the `PEXELS_API_KEY` environment variable.
    pub fn from_env(timeout: Duration) -> PipelineResult<Self> {
        let api_key = std::env::var("PEXELS_API_KEY")
            .map_err(|_| PipelineError::config_error("PEXELS_API_KEY not set"))?;
        let base_url =
            std::env::var("PEXELS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, api_key, timeout)
    }

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::config_error(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl FootageSearch for PexelsClient {
    async fn search(&self, query: &str) -> PipelineResult<Option<StockHit>> {
        let response = self
            .client
            .get(format!("{}/videos/search", self.base_url))
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query),
                ("orientation", "landscape"),
                ("size", "medium"),
                ("per_page", "1"),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::upstream(format!("stock search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(format!(
                "stock search returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::upstream(format!("stock search response unreadable: {}", e)))?;

        let hit = parsed.videos.into_iter().next().map(|video| StockHit {
            duration: video.duration,
            files: video
                .video_files
                .into_iter()
                .map(|f| StockFile {
                    quality: f.quality,
                    height: f.height,
                    url: f.link,
                })
                .collect(),
        });

        debug!(
            "stock search for '{}' {}",
            query,
            if hit.is_some() { "hit" } else { "missed" }
        );
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_maps_file_variants() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .and(query_param("query", "mountain"))
            .and(query_param("orientation", "landscape"))
            .and(query_param("per_page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "videos": [{
                    "duration": 12.0,
                    "video_files": [
                        {"quality": "hd", "height": 1080, "link": "https://cdn.pexels.com/hd.mp4"},
                        {"quality": "md", "height": 720, "link": "https://cdn.pexels.com/md.mp4"}
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new(server.uri(), "key", Duration::from_secs(5)).unwrap();
        let hit = client.search("mountain").await.unwrap().unwrap();
        assert_eq!(hit.duration, 12.0);
        assert_eq!(hit.files.len(), 2);
        assert_eq!(hit.files[1].quality.as_deref(), Some("md"));
    }

    #[tokio::test]
    async fn empty_results_are_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "videos": []
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new(server.uri(), "key", Duration::from_secs(5)).unwrap();
        assert!(client.search("nothing").await.unwrap().is_none());
    }
}
