//! B-roll resolution stage.
//!
//! One stock-footage search per keyword candidate, sequentially. A
//! keyword with no usable result is dropped with a warning; an empty
//! resolved set is a valid outcome, not an error.

use tracing::{info, warn};

use broll_models::{BrollClip, KeywordCandidate};

use crate::error::PipelineResult;
use crate::services::{FootageSearch, StockFile, StockHit};

/// Resolve each candidate to a stock clip.
pub async fn resolve_broll(
    search: &dyn FootageSearch,
    candidates: &[KeywordCandidate],
) -> PipelineResult<Vec<BrollClip>> {
    let mut clips = Vec::new();
    for candidate in candidates {
        match search.search(&candidate.keyword).await? {
            Some(hit) => match pick_variant(&hit) {
                Some(file) => {
                    clips.push(BrollClip {
                        keyword: candidate.keyword.clone(),
                        timestamp: candidate.timestamp,
                        source_url: file.url.clone(),
                        duration: hit.duration,
                    });
                }
                None => warn!("no file variants for keyword '{}', dropping", candidate.keyword),
            },
            None => warn!("no stock footage for keyword '{}', dropping", candidate.keyword),
        }
    }
    info!("resolved {} of {} keywords", clips.len(), candidates.len());
    Ok(clips)
}

/// Pick a file variant: "md" quality first, then anything under 1080p,
/// then whatever comes first.
fn pick_variant(hit: &StockHit) -> Option<&StockFile> {
    hit.files
        .iter()
        .find(|f| f.quality.as_deref() == Some("md"))
        .or_else(|| hit.files.iter().find(|f| f.height.is_some_and(|h| h < 1080)))
        .or_else(|| hit.files.first())
}
