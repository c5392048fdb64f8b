//! Master animatic splitter.
//!
//! Cuts one master movie into per-scene movies named `C001.mp4`, `C002.mp4`,
//! ... from a list of frame counts. Cuts are frame-exact: video is trimmed by
//! frame index and re-encoded, audio (when present) is trimmed by the
//! matching time range.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{BatchError, Result};

/// Parse one frame-count entry: digits only (surrounding whitespace allowed),
/// greater than zero.
pub fn parse_frame_count(value: &str) -> Result<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BatchError::invalid_field(
            "frame_count",
            format!("not a frame count: {:?}", value),
        ));
    }
    let frames: u32 = trimmed
        .parse()
        .map_err(|e| BatchError::invalid_field("frame_count", format!("{}: {:?}", e, value)))?;
    if frames == 0 {
        return Err(BatchError::invalid_field(
            "frame_count",
            "must be greater than zero",
        ));
    }
    Ok(frames)
}

/// Parse a frame rate given as `num/den` (ffprobe's `r_frame_rate`) or a
/// decimal number.
pub fn parse_frame_rate(value: &str) -> Result<f64> {
    let value = value.trim();
    let invalid = || BatchError::invalid_field("frame_rate", format!("{:?}", value));

    let fps = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().map_err(|_| invalid())?;
            let den: f64 = den.trim().parse().map_err(|_| invalid())?;
            if den == 0.0 {
                return Err(invalid());
            }
            num / den
        }
        None => value.parse().map_err(|_| invalid())?,
    };

    if !fps.is_finite() || fps <= 0.0 {
        return Err(invalid());
    }
    Ok(fps)
}

/// One output movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub index: u32,
    pub name: String,
    /// First frame, inclusive.
    pub start_frame: u64,
    /// Last frame, exclusive.
    pub end_frame: u64,
}

impl Segment {
    pub fn frames(&self) -> u64 {
        self.end_frame - self.start_frame
    }
}

/// Lay frame counts end to end, naming segments from `start_index`.
pub fn plan_segments(frame_counts: &[u32], start_index: u32) -> Result<Vec<Segment>> {
    let mut start = 0u64;
    let mut segments = Vec::with_capacity(frame_counts.len());
    for (offset, &frames) in frame_counts.iter().enumerate() {
        let index = u32::try_from(offset)
            .ok()
            .and_then(|offset| start_index.checked_add(offset))
            .ok_or_else(|| {
                BatchError::invalid_field(
                    "start_index",
                    format!("{} + {} segments overflows", start_index, frame_counts.len()),
                )
            })?;
        let end = start + u64::from(frames);
        segments.push(Segment {
            index,
            name: format!("C{:03}.mp4", index),
            start_frame: start,
            end_frame: end,
        });
        start = end;
    }
    Ok(segments)
}

/// ffmpeg arguments (without the executable) producing `output` from `input`.
pub fn ffmpeg_args(input: &Path, output: &Path, segment: &Segment, fps: f64, has_audio: bool) -> Vec<String> {
    let trim = format!(
        "trim=start_frame={}:end_frame={},setpts=PTS-STARTPTS",
        segment.start_frame, segment.end_frame
    );

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
    ];

    if has_audio {
        let start_time = segment.start_frame as f64 / fps;
        let end_time = segment.end_frame as f64 / fps;
        let filter = format!(
            "[0:v]{}[v];[0:a]atrim=start={:.6}:end={:.6},asetpts=PTS-STARTPTS[a]",
            trim, start_time, end_time
        );
        args.extend(
            [
                "-filter_complex", filter.as_str(),
                "-map", "[v]",
                "-map", "[a]",
                "-c:v", "libx264",
                "-crf", "18",
                "-preset", "veryfast",
                "-c:a", "aac",
                "-b:a", "192k",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
    } else {
        args.extend(
            [
                "-vf", trim.as_str(),
                "-an",
                "-c:v", "libx264",
                "-crf", "18",
                "-preset", "veryfast",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
    }

    args.push(output.to_string_lossy().into_owned());
    args
}

fn run_capture(program: &str, args: &[String]) -> Result<std::process::Output> {
    debug!("{} {}", program, args.join(" "));
    Command::new(program)
        .args(args)
        .output()
        .map_err(|e| BatchError::process(format!("Failed to run {}: {}", program, e)))
}

/// Frame rate of the first video stream.
pub fn probe_fps(ffprobe: &str, master: &Path) -> Result<f64> {
    let args: Vec<String> = [
        "-v", "error",
        "-select_streams", "v:0",
        "-show_entries", "stream=r_frame_rate",
        "-of", "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(master.to_string_lossy().into_owned()))
    .collect();

    let output = run_capture(ffprobe, &args)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().unwrap_or("").trim();
    if !output.status.success() || first.is_empty() {
        return Err(BatchError::process(format!(
            "Could not detect the frame rate of {:?}",
            master
        )));
    }
    parse_frame_rate(first)
}

/// Probed rate, or `fallback` when the probe gave nothing usable.
fn frame_rate_or(probed: Result<f64>, fallback: f64) -> f64 {
    match probed {
        Ok(fps) => fps,
        Err(e) => {
            warn!("{}; assuming {} fps", e, fallback);
            fallback
        }
    }
}

/// Whether the movie has at least one audio stream.
pub fn probe_has_audio(ffprobe: &str, master: &Path) -> Result<bool> {
    let args: Vec<String> = [
        "-v", "error",
        "-select_streams", "a",
        "-show_entries", "stream=index",
        "-of", "csv=p=0",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(master.to_string_lossy().into_owned()))
    .collect();

    let output = run_capture(ffprobe, &args)?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Inputs of a split run.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub master: PathBuf,
    pub out_dir: PathBuf,
    pub frame_counts: Vec<u32>,
    pub start_index: u32,
    pub ffmpeg: String,
    pub ffprobe: String,
    /// Used when ffprobe reports no frame rate
    pub fallback_fps: f64,
}

/// Split the master into one movie per segment. Stops at the first ffmpeg
/// failure. Returns the written files.
pub fn split_master(request: &SplitRequest, dry_run: bool) -> Result<Vec<PathBuf>> {
    if !request.master.is_file() {
        return Err(BatchError::not_found(
            "Master movie",
            &[request.master.to_string_lossy().into_owned()],
        ));
    }
    if request.frame_counts.is_empty() {
        return Err(BatchError::validation("at least one frame count is required"));
    }

    info!("=== MP4 SPLITTER ===");
    info!("Master: {:?}", request.master);
    info!("Output: {:?}", request.out_dir);
    info!("First scene: C{:03}", request.start_index);
    info!("Frames per scene: {:?}", request.frame_counts);

    let segments = plan_segments(&request.frame_counts, request.start_index)?;
    let fps = frame_rate_or(
        probe_fps(&request.ffprobe, &request.master),
        request.fallback_fps,
    );
    let has_audio = probe_has_audio(&request.ffprobe, &request.master)?;
    info!("Detected fps: {:.6}", fps);
    info!("Audio stream: {}", has_audio);

    if !dry_run {
        fs::create_dir_all(&request.out_dir)?;
    }

    let mut written = Vec::new();
    for segment in segments {
        let out = request.out_dir.join(&segment.name);
        let args = ffmpeg_args(&request.master, &out, &segment, fps, has_audio);
        info!(
            "{}: frames {} -> {} ({})",
            segment.name,
            segment.start_frame,
            segment.end_frame - 1,
            segment.frames()
        );

        if dry_run {
            info!("[DRY RUN] {} {}", request.ffmpeg, args.join(" "));
            written.push(out);
            continue;
        }

        let output = run_capture(&request.ffmpeg, &args)?;
        debug!("ffmpeg stderr:\n{}", String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            return Err(BatchError::process(format!(
                "ffmpeg failed to write {} (exit code {})",
                segment.name,
                output.status.code().unwrap_or(-1)
            )));
        }
        written.push(out);
    }

    info!("{} movie(s) written", written.len());
    Ok(written)
}
