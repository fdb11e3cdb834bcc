//! Keyword candidates and resolved b-roll clips.

use serde::{Deserialize, Serialize};

/// A moment in the main video worth illustrating with b-roll.
///
/// Produced by the keyword extractor from the transcript; consumed by
/// the b-roll resolver and the edit-plan generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCandidate {
    /// Search keyword, non-empty
    pub keyword: String,
    /// Position in the main video, seconds from the start, >= 0
    pub timestamp: f64,
}

impl KeywordCandidate {
    pub fn new(keyword: impl Into<String>, timestamp: f64) -> Self {
        Self {
            keyword: keyword.into(),
            timestamp,
        }
    }
}

/// One stock clip resolved for a keyword.
///
/// The keyword doubles as the clip's unique key: edit instructions
/// reference clips by it. A keyword that resolved to nothing simply has
/// no `BrollClip`, which is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrollClip {
    /// Keyword this clip was found for (unique key)
    pub keyword: String,
    /// Timestamp carried over from the candidate; the fallback edit
    /// plan places the clip here
    pub timestamp: f64,
    /// Remote URL of the selected file variant
    pub source_url: String,
    /// Stock clip duration in seconds, > 0
    pub duration: f64,
}
