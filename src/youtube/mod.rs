//! YouTube helpers: URL parsing, transcripts and search.
//!
//! Network access goes through `yt-dlp`, which must be on `PATH`.

mod search;
mod transcript;

pub use search::{search_videos, SearchResult};
pub use transcript::{fetch_metadata, fetch_transcript, VideoMetadata};

use crate::error::{Result, SummariserError};
use crate::summary::VideoRef;
use regex::Regex;
use std::process::{Output, Stdio};
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::debug;
use url::Url;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex")
});

/// Path prefixes that are followed by a video id.
const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "e", "shorts", "live"];

fn normalize_host(host: &str) -> &str {
    let host = host.trim_start_matches("www.");
    host.strip_prefix("m.")
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(host)
}

fn is_youtube_host(host: &str) -> bool {
    matches!(
        normalize_host(host),
        "youtube.com" | "youtu.be" | "youtube-nocookie.com"
    )
}

fn parse_url(input: &str) -> Option<Url> {
    Url::parse(input)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| Url::parse(&format!("https://{}", input)).ok())
}

fn checked_id(candidate: &str) -> Option<String> {
    VIDEO_ID
        .is_match(candidate)
        .then(|| candidate.to_string())
}

/// Extract the 11-character video id from a YouTube URL or a bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(id) = checked_id(input) {
        return Some(id);
    }

    let url = parse_url(input)?;
    let host = url.host_str()?.to_ascii_lowercase();
    if !is_youtube_host(&host) {
        return None;
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if normalize_host(&host) == "youtu.be" {
        return segments.first().and_then(|s| checked_id(s));
    }

    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        return checked_id(&v);
    }

    match segments.as_slice() {
        [prefix, id, ..] if ID_PATH_PREFIXES.contains(prefix) => checked_id(id),
        _ => None,
    }
}

/// Whether `input` is a YouTube URL that points at a video.
pub fn validate_url(input: &str) -> bool {
    let Some(url) = parse_url(input.trim()) else {
        return false;
    };
    let host_ok = url
        .host_str()
        .map(|h| is_youtube_host(&h.to_ascii_lowercase()))
        .unwrap_or(false);
    host_ok && extract_video_id(input).is_some()
}

/// The watch URL for a video id.
pub fn canonical_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Resolve user input to a video reference with a canonical URL.
pub fn video_ref(input: &str) -> Result<VideoRef> {
    let id = extract_video_id(input).ok_or_else(|| {
        SummariserError::InvalidInput(format!("Invalid YouTube URL or video ID: {}", input))
    })?;
    let url = canonical_url(&id);
    Ok(VideoRef::new(id, url))
}

/// `M:SS` below an hour, `H:MM:SS` above.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Like [`format_duration`], with `??:??` for unknown lengths.
pub fn format_optional_duration(seconds: Option<u64>) -> String {
    seconds
        .map(format_duration)
        .unwrap_or_else(|| "??:??".to_string())
}

/// Transcript timestamp, `MM:SS` with minutes running past 59.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Run yt-dlp and return its output, mapping a missing binary to `ToolNotFound`.
pub(crate) async fn run_ytdlp(args: &[&str]) -> Result<Output> {
    debug!(?args, "Running yt-dlp");
    Command::new("yt-dlp")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SummariserError::ToolNotFound("yt-dlp".to_string())
            } else {
                SummariserError::Io(e)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        let id = Some("dQw4w9WgXcQ".to_string());
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?feature=shared",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
            "  dQw4w9WgXcQ  ",
        ] {
            assert_eq!(extract_video_id(input), id, "{input}");
        }
    }

    #[test]
    fn test_extract_video_id_rejects() {
        for input in [
            "",
            "not-a-video-id",
            "https://vimeo.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/playlist?list=PL123",
            "https://www.youtube.com/watch?v=short",
            "https://youtu.be/",
        ] {
            assert_eq!(extract_video_id(input), None, "{input}");
        }
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(!validate_url("https://example.com/watch?v=dQw4w9WgXcQ"));
        assert!(!validate_url("https://www.youtube.com/feed/trending"));
    }

    #[test]
    fn test_video_ref() {
        let video = video_ref("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(matches!(
            video_ref("https://example.com"),
            Err(SummariserError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(600), "10:00");
        assert_eq!(format_duration(3725), "1:02:05");
        assert_eq!(format_optional_duration(None), "??:??");
        assert_eq!(format_timestamp(65.9), "01:05");
        assert_eq!(format_timestamp(3725.0), "62:05");
    }
}
