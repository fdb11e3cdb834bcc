//! FFmpeg CLI wrapper.
//!
//! Probing via ffprobe, timeline rendering via a single ffmpeg
//! `filter_complex` pass, and a startup check that both tools exist.

mod compose;
mod error;
mod probe;
mod tools;

pub use compose::{render_timeline, BROLL_FADE_IN_SECS};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use tools::check_tooling;
