//! OpenAI-compatible client for chat completions and transcription.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::services::{Completion, Transcriber};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-1";

/// OpenAI-compatible API client.
///
/// Base URL and model names come from the environment so provider and
/// model choice stay configuration, not code.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    transcribe_model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl OpenAiClient {
    /// Create a new client from environment variables.
    pub fn from_env(timeout: Duration) -> PipelineResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| PipelineError::config_error("OPENAI_API_KEY not set"))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let chat_model =
            std::env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let transcribe_model = std::env::var("OPENAI_TRANSCRIBE_MODEL")
            .unwrap_or_else(|_| DEFAULT_TRANSCRIBE_MODEL.to_string());

        Self::new(base_url, api_key, chat_model, transcribe_model, timeout)
    }

    /// Create a client with the given upstream timeout. The timeout is
    /// load-bearing: a hung provider must not hang the pipeline.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chat_model: impl Into<String>,
        transcribe_model: impl Into<String>,
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
            chat_model: chat_model.into(),
            transcribe_model: transcribe_model.into(),
        })
    }
}

#[async_trait]
impl Completion for OpenAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> PipelineResult<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::upstream(format!("chat completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(format!(
                "chat completion returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::upstream(format!("chat completion response unreadable: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PipelineError::upstream("chat completion had no choices"))?;

        debug!("chat completion returned {} bytes", content.len());
        Ok(content)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, video: &Path) -> PipelineResult<String> {
        let bytes = tokio::fs::read(video).await?;
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| PipelineError::upstream(format!("invalid multipart body: {}", e)))?;
        let form = multipart::Form::new()
            .text("model", self.transcribe_model.clone())
            .text("response_format", "json")
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::upstream(format!("transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(format!(
                "transcription returned {}: {}",
                status, body
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::upstream(format!("transcription response unreadable: {}", e)))?;

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            server.uri(),
            "test-key",
            "gpt-4o-mini",
            "whisper-1",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn completion_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "[{\"keyword\":\"mountain\",\"timestamp\":10}]"}}]
            })))
            .mount(&server)
            .await;

        let reply = client(&server).complete("system", "transcript").await.unwrap();
        assert!(reply.contains("mountain"));
    }

    #[tokio::test]
    async fn completion_error_status_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).complete("system", "user").await.unwrap_err();
        assert!(matches!(err, PipelineError::Upstream(_)));
    }

    #[tokio::test]
    async fn transcription_parses_text_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "We climbed a mountain near a river"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("source.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let text = client(&server).transcribe(&video).await.unwrap();
        assert_eq!(text, "We climbed a mountain near a river");
    }
}
