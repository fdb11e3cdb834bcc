//! Production composer backed by ffmpeg.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use broll_media::{probe_video, render_timeline};
use broll_models::{build_timeline, EditPlan};

use crate::error::PipelineResult;
use crate::services::Composer;

/// Assembles the final video by deriving a timeline from the edit plan
/// and rendering it in a single ffmpeg pass.
pub struct FfmpegComposer;

#[async_trait]
impl Composer for FfmpegComposer {
    async fn assemble(
        &self,
        main: &Path,
        broll: &HashMap<String, PathBuf>,
        plan: &EditPlan,
        output: &Path,
    ) -> PipelineResult<()> {
        let info = probe_video(main).await?;
        let segments = build_timeline(plan, info.duration);
        info!(
            "assembling {} segments over {:.1}s of main footage",
            segments.len(),
            info.duration
        );
        render_timeline(main, broll, &segments, output).await?;
        Ok(())
    }
}
