//! Video search by title.

use super::{canonical_url, extract_video_id, run_ytdlp};
use crate::error::{Result, SummariserError};
use serde::Serialize;
use tracing::{instrument, warn};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub channel: Option<String>,
    /// Seconds.
    pub duration: Option<u64>,
    pub url: String,
}

/// Search YouTube for up to `max_results` videos.
#[instrument]
pub async fn search_videos(query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SummariserError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    if max_results == 0 {
        return Err(SummariserError::InvalidInput(
            "max results must be at least 1".to_string(),
        ));
    }

    let target = format!("ytsearch{}:{}", max_results, query);
    let output = run_ytdlp(&["--dump-json", "--flat-playlist", "--no-warnings", &target]).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SummariserError::Search(stderr.trim().to_string()));
    }

    let mut results = parse_search_output(&String::from_utf8_lossy(&output.stdout));
    results.truncate(max_results);
    Ok(results)
}

/// One JSON object per line, as printed by `--dump-json --flat-playlist`.
fn parse_search_output(stdout: &str) -> Vec<SearchResult> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<serde_json::Value>(line) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Skipping unparseable search result: {}", e);
                None
            }
        })
        .filter_map(|json| {
            let id = json["id"]
                .as_str()
                .and_then(extract_video_id)
                .or_else(|| json["url"].as_str().and_then(extract_video_id))?;

            Some(SearchResult {
                url: canonical_url(&id),
                title: json["title"]
                    .as_str()
                    .unwrap_or("Unknown Title")
                    .to_string(),
                channel: json["channel"]
                    .as_str()
                    .or_else(|| json["uploader"].as_str())
                    .map(str::to_string),
                duration: json["duration"].as_f64().map(|d| d.max(0.0) as u64),
                id,
            })
        })
        .collect()
}
