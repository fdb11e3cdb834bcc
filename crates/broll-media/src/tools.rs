//! Media tooling presence check.

use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Verify ffmpeg and ffprobe are installed and on PATH.
///
/// Workers call this at startup so a missing codec toolchain fails the
/// process immediately instead of the first job.
pub fn check_tooling() -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;
    info!("FFmpeg tooling check passed");
    Ok(())
}
