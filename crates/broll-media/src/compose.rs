//! Timeline rendering.
//!
//! Renders an assembled timeline in one ffmpeg pass: every segment is
//! trimmed and normalized (scale, frame rate, audio format) inside a
//! `filter_complex` graph, b-roll segments get their fade-in, and the
//! pieces are concatenated into the output file. A single pass avoids
//! intermediate files entirely, so there is nothing extra to clean up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use broll_models::TimelineSegment;

use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Fade-in applied to the start of every b-roll segment, seconds.
pub const BROLL_FADE_IN_SECS: f64 = 0.5;

const AUDIO_RATE: u32 = 44100;

/// Render a timeline into `output`.
///
/// `broll` maps clip IDs (keywords) to downloaded clip files. Every
/// b-roll segment must resolve to an entry; a miss is fatal because the
/// plan already committed to that clip.
pub async fn render_timeline(
    main: &Path,
    broll: &HashMap<String, PathBuf>,
    segments: &[TimelineSegment],
    output: &Path,
) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    if segments.is_empty() {
        return Err(MediaError::InvalidVideo(
            "timeline has no segments".to_string(),
        ));
    }

    let info = probe_video(main).await?;

    // Inputs: main video first, then each referenced clip once, in
    // first-use order.
    let mut inputs: Vec<&Path> = vec![main];
    let mut input_index: HashMap<&str, usize> = HashMap::new();
    for segment in segments {
        if let TimelineSegment::Broll { clip_id, .. } = segment {
            if !input_index.contains_key(clip_id.as_str()) {
                let path = broll
                    .get(clip_id)
                    .ok_or_else(|| MediaError::MissingClip(clip_id.clone()))?;
                input_index.insert(clip_id, inputs.len());
                inputs.push(path);
            }
        }
    }

    let graph = build_filter_graph(segments, &input_index, info.width, info.height, info.fps, info.has_audio);
    debug!("filter graph: {}", graph);

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y");
    for input in &inputs {
        cmd.arg("-i").arg(input);
    }
    cmd.args(["-filter_complex", &graph])
        .args(["-map", "[vout]", "-map", "[aout]"])
        .args(["-c:v", "libx264", "-preset", "veryfast", "-crf", "23"])
        .args(["-c:a", "aac", "-movflags", "+faststart"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    info!(
        "Rendering {} segments ({} inputs) -> {}",
        segments.len(),
        inputs.len(),
        output.display()
    );

    let result = cmd.output().await?;
    if !result.status.success() {
        return Err(MediaError::ffmpeg_failed(
            "timeline render failed",
            Some(String::from_utf8_lossy(&result.stderr).to_string()),
            result.status.code(),
        ));
    }

    info!("Rendered timeline to {}", output.display());
    Ok(())
}

/// Build the `filter_complex` graph for a timeline.
///
/// Each segment yields a normalized `[v{i}]`/`[a{i}]` pair; the final
/// concat joins them. B-roll audio is synthesized silence so the
/// concat's audio streams stay uniform whatever the stock clip carries.
fn build_filter_graph(
    segments: &[TimelineSegment],
    input_index: &HashMap<&str, usize>,
    width: u32,
    height: u32,
    fps: f64,
    main_has_audio: bool,
) -> String {
    let mut chains = Vec::with_capacity(segments.len() * 2 + 1);
    let normalize = format!("scale={}:{},fps={:.3}", width, height, fps);
    let audio_normalize = format!(
        "aformat=sample_rates={}:channel_layouts=stereo",
        AUDIO_RATE
    );

    for (i, segment) in segments.iter().enumerate() {
        match segment {
            TimelineSegment::Main { start, end } => {
                chains.push(format!(
                    "[0:v]trim=start={:.3}:end={:.3},setpts=PTS-STARTPTS,{}[v{}]",
                    start, end, normalize, i
                ));
                if main_has_audio {
                    chains.push(format!(
                        "[0:a]atrim=start={:.3}:end={:.3},asetpts=PTS-STARTPTS,{}[a{}]",
                        start, end, audio_normalize, i
                    ));
                } else {
                    chains.push(format!(
                        "anullsrc=channel_layout=stereo:sample_rate={},atrim=start=0:end={:.3}[a{}]",
                        AUDIO_RATE,
                        end - start,
                        i
                    ));
                }
            }
            TimelineSegment::Broll { clip_id, duration } => {
                let input = input_index[clip_id.as_str()];
                chains.push(format!(
                    "[{}:v]trim=start=0:end={:.3},setpts=PTS-STARTPTS,{},fade=t=in:st=0:d={:.3}[v{}]",
                    input, duration, normalize, BROLL_FADE_IN_SECS, i
                ));
                chains.push(format!(
                    "anullsrc=channel_layout=stereo:sample_rate={},atrim=start=0:end={:.3}[a{}]",
                    AUDIO_RATE, duration, i
                ));
            }
        }
    }

    let pads: String = (0..segments.len())
        .map(|i| format!("[v{i}][a{i}]"))
        .collect();
    chains.push(format!(
        "{}concat=n={}:v=1:a=1[vout][aout]",
        pads,
        segments.len()
    ));

    chains.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index<'a>(pairs: &[(&'a str, usize)]) -> HashMap<&'a str, usize> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn graph_for_single_main_segment() {
        let segments = vec![TimelineSegment::Main { start: 0.0, end: 30.0 }];
        let graph = build_filter_graph(&segments, &index(&[]), 1920, 1080, 30.0, true);

        assert!(graph.contains("[0:v]trim=start=0.000:end=30.000"));
        assert!(graph.contains("[0:a]atrim=start=0.000:end=30.000"));
        assert!(graph.contains("concat=n=1:v=1:a=1[vout][aout]"));
        assert!(!graph.contains("fade"));
    }

    #[test]
    fn graph_applies_fade_to_broll() {
        let segments = vec![
            TimelineSegment::Main { start: 0.0, end: 10.0 },
            TimelineSegment::Broll { clip_id: "mountain".into(), duration: 3.0 },
            TimelineSegment::Main { start: 13.0, end: 25.0 },
        ];
        let graph =
            build_filter_graph(&segments, &index(&[("mountain", 1)]), 1280, 720, 25.0, true);

        assert!(graph.contains("[1:v]trim=start=0:end=3.000"));
        assert!(graph.contains("fade=t=in:st=0:d=0.500"));
        assert!(graph.contains("concat=n=3:v=1:a=1[vout][aout]"));
        // B-roll audio is synthesized.
        assert!(graph.contains("anullsrc"));
    }

    #[test]
    fn silent_main_gets_synthesized_audio() {
        let segments = vec![TimelineSegment::Main { start: 5.0, end: 9.0 }];
        let graph = build_filter_graph(&segments, &index(&[]), 1920, 1080, 30.0, false);

        assert!(!graph.contains("[0:a]"));
        assert!(graph.contains("anullsrc"));
        assert!(graph.contains("atrim=start=0:end=4.000"));
    }

    #[test]
    fn repeated_clip_reuses_one_input() {
        let segments = vec![
            TimelineSegment::Broll { clip_id: "river".into(), duration: 2.0 },
            TimelineSegment::Broll { clip_id: "river".into(), duration: 3.0 },
        ];
        let graph = build_filter_graph(&segments, &index(&[("river", 1)]), 640, 360, 30.0, true);
        assert!(graph.contains("[1:v]trim=start=0:end=2.000"));
        assert!(graph.contains("[1:v]trim=start=0:end=3.000"));
        assert!(graph.contains("concat=n=2"));
    }
}
