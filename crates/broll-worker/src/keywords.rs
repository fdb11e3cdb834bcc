//! Keyword extraction stage.
//!
//! Asks the model for visually-searchable keywords anchored to
//! transcript timestamps. Any malformed reply is replaced by the
//! deterministic fallback so the pipeline keeps moving.

use tracing::warn;

use broll_models::KeywordCandidate;

use crate::error::PipelineResult;
use crate::llm_json::{self, ModelResponseError};
use crate::services::Completion;

const KEYWORD_SYSTEM_PROMPT: &str = "You analyze video transcripts and pick moments where \
cutaway stock footage would strengthen the video. Respond with a JSON array only, no prose, \
no markdown. Each element must be an object with exactly two keys: \"keyword\" (a short, \
concrete, visually searchable phrase such as \"mountain sunrise\" or \"city traffic\") and \
\"timestamp\" (seconds from the start of the video, as a number). Pick between three and \
five moments.";

/// Extract keyword candidates from a transcript.
///
/// Upstream failures propagate; malformed model output does not — it is
/// logged and replaced by [`fallback_candidates`].
pub async fn extract(
    completion: &dyn Completion,
    transcript: &str,
) -> PipelineResult<Vec<KeywordCandidate>> {
    let reply = completion.complete(KEYWORD_SYSTEM_PROMPT, transcript).await?;
    match parse_candidates(&reply) {
        Ok(candidates) => Ok(candidates),
        Err(reason) => {
            warn!("keyword extraction reply rejected ({}), using fallback", reason);
            Ok(fallback_candidates())
        }
    }
}

/// Decode and validate a model reply as a keyword candidate list.
fn parse_candidates(raw: &str) -> Result<Vec<KeywordCandidate>, ModelResponseError> {
    let candidates: Vec<KeywordCandidate> = llm_json::decode(raw)?;
    if candidates.is_empty() {
        return Err(ModelResponseError::schema("empty candidate list"));
    }
    for candidate in &candidates {
        if candidate.keyword.trim().is_empty() {
            return Err(ModelResponseError::schema("blank keyword"));
        }
        if !candidate.timestamp.is_finite() || candidate.timestamp < 0.0 {
            return Err(ModelResponseError::schema(format!(
                "bad timestamp {} for '{}'",
                candidate.timestamp, candidate.keyword
            )));
        }
    }
    Ok(candidates)
}

/// One generic keyword at the start of the video.
pub fn fallback_candidates() -> Vec<KeywordCandidate> {
    vec![KeywordCandidate {
        keyword: "general".to_string(),
        timestamp: 0.0,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedCompletion(String);

    #[async_trait]
    impl Completion for CannedCompletion {
        async fn complete(&self, _system: &str, _user: &str) -> PipelineResult<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn well_formed_reply_is_parsed() {
        let completion = CannedCompletion(
            r#"[{"keyword": "mountain", "timestamp": 10}, {"keyword": "river", "timestamp": 25.5}]"#
                .to_string(),
        );
        let candidates = extract(&completion, "transcript").await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].keyword, "mountain");
        assert_eq!(candidates[1].timestamp, 25.5);
    }

    #[tokio::test]
    async fn fenced_reply_is_parsed() {
        let completion = CannedCompletion(
            "```json\n[{\"keyword\": \"city\", \"timestamp\": 3}]\n```".to_string(),
        );
        let candidates = extract(&completion, "transcript").await.unwrap();
        assert_eq!(candidates[0].keyword, "city");
    }

    #[tokio::test]
    async fn prose_reply_falls_back() {
        let completion = CannedCompletion("Sure! Here are some keywords: mountain".to_string());
        let candidates = extract(&completion, "transcript").await.unwrap();
        assert_eq!(candidates, fallback_candidates());
    }

    #[tokio::test]
    async fn negative_timestamp_falls_back() {
        let completion =
            CannedCompletion(r#"[{"keyword": "mountain", "timestamp": -4}]"#.to_string());
        let candidates = extract(&completion, "transcript").await.unwrap();
        assert_eq!(candidates, fallback_candidates());
    }

    #[tokio::test]
    async fn blank_keyword_falls_back() {
        let completion = CannedCompletion(r#"[{"keyword": "  ", "timestamp": 1}]"#.to_string());
        let candidates = extract(&completion, "transcript").await.unwrap();
        assert_eq!(candidates, fallback_candidates());
    }

    #[tokio::test]
    async fn empty_list_falls_back() {
        let completion = CannedCompletion("[]".to_string());
        let candidates = extract(&completion, "transcript").await.unwrap();
        assert_eq!(candidates, fallback_candidates());
    }
}
