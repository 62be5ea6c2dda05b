//! Video metadata and transcript retrieval via yt-dlp.

use super::{canonical_url, format_timestamp, run_ytdlp};
use crate::error::{Result, SummariserError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Subtitle languages requested from yt-dlp, in preference order.
const SUBTITLE_LANGS: &str = "en,en-US,en-GB,en.*";

/// Basic information about a video.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub duration: Option<Duration>,
    pub channel: Option<String>,
}

/// Fetch title, duration and channel.
#[instrument]
pub async fn fetch_metadata(video_id: &str) -> Result<VideoMetadata> {
    let url = canonical_url(video_id);
    let output = run_ytdlp(&["--dump-json", "--no-download", "--no-warnings", &url]).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SummariserError::VideoNotFound(format!(
            "Video {} not found or unavailable: {}",
            video_id,
            stderr.trim()
        )));
    }

    parse_metadata(video_id, &String::from_utf8_lossy(&output.stdout))
}

fn parse_metadata(video_id: &str, json: &str) -> Result<VideoMetadata> {
    let json: serde_json::Value = serde_json::from_str(json)?;

    Ok(VideoMetadata {
        id: video_id.to_string(),
        title: json["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string(),
        duration: json["duration"]
            .as_f64()
            .filter(|d| *d >= 0.0)
            .map(Duration::from_secs_f64),
        channel: json["channel"]
            .as_str()
            .or_else(|| json["uploader"].as_str())
            .map(str::to_string),
    })
}

/// Download subtitles (manual preferred, automatic otherwise) and format them as
/// `[MM:SS] text` lines.
#[instrument]
pub async fn fetch_transcript(video_id: &str) -> Result<String> {
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("%(id)s.%(ext)s");
    let template = template.to_string_lossy();
    let url = canonical_url(video_id);

    let output = run_ytdlp(&[
        "--skip-download",
        "--write-subs",
        "--write-auto-subs",
        "--sub-langs",
        SUBTITLE_LANGS,
        "--sub-format",
        "json3",
        "--no-warnings",
        "--no-playlist",
        "--output",
        &template,
        &url,
    ])
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SummariserError::Transcript(format!(
            "Failed to get video transcript: {}",
            stderr.trim()
        )));
    }

    let files = subtitle_files(dir.path())?;
    let path = pick_subtitle_file(&files).ok_or_else(|| {
        SummariserError::Transcript(format!("No transcript available for video {}", video_id))
    })?;
    debug!(path = %path.display(), "Using subtitle file");

    let transcript = parse_json3(&std::fs::read_to_string(path)?)?;
    if transcript.is_empty() {
        return Err(SummariserError::Transcript(format!(
            "Empty transcript received for video {}",
            video_id
        )));
    }

    info!(lines = transcript.lines().count(), "Transcript retrieved");
    Ok(transcript)
}

fn subtitle_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json3") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Language tag between the id and the extension: `<id>.<lang>.json3`.
fn subtitle_lang(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit_once('.').map(|(_, lang)| lang)
}

/// Prefer plain `en`, then any English variant, then whatever was written.
fn pick_subtitle_file(files: &[PathBuf]) -> Option<&PathBuf> {
    files
        .iter()
        .find(|p| subtitle_lang(p) == Some("en"))
        .or_else(|| {
            files
                .iter()
                .find(|p| subtitle_lang(p).is_some_and(|l| l.starts_with("en")))
        })
        .or_else(|| files.first())
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Convert a json3 subtitle document to timestamped transcript lines.
fn parse_json3(content: &str) -> Result<String> {
    let doc: Json3 = serde_json::from_str(content)
        .map_err(|e| SummariserError::Transcript(format!("Malformed subtitle file: {}", e)))?;

    let lines: Vec<String> = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(format!(
                "[{}] {}",
                format_timestamp(event.start_ms as f64 / 1000.0),
                text
            ))
        })
        .collect();

    Ok(lines.join("\n"))
}
