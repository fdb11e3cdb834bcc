//! Strict decoding of untrusted model output.
//!
//! Everything a language model returns is text that merely claims to be
//! JSON. Callers decode through [`decode`], which strips markdown code
//! fences and produces either a typed value or a tagged reason — never
//! a panic, never duck-typed access.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a model response was rejected. Stage-local: callers recover via
/// their deterministic fallback and this never reaches the job status.
#[derive(Debug, Error)]
pub enum ModelResponseError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema violation: {0}")]
    Schema(String),
}

impl ModelResponseError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }
}

/// Decode a model reply into `T`, tolerating ```json fences.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, ModelResponseError> {
    Ok(serde_json::from_str(strip_code_fences(raw))?)
}

/// Strip a leading ```/```json fence and a trailing ``` if present.
fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
