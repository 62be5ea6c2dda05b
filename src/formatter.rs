//! Rendering of finished summaries.

use crate::summary::SummaryResult;
use std::fmt;
use std::str::FromStr;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatKind {
    #[default]
    Markdown,
    Plain,
}

impl FormatKind {
    /// File extension for saved summaries.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatKind::Markdown => "md",
            FormatKind::Plain => "txt",
        }
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(FormatKind::Markdown),
            "plain" | "text" | "txt" => Ok(FormatKind::Plain),
            _ => Err(format!("Unknown format: {} (expected markdown or plain)", s)),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Markdown => write!(f, "markdown"),
            FormatKind::Plain => write!(f, "plain"),
        }
    }
}

/// Render a summary with its metadata header.
pub fn format(result: &SummaryResult, kind: FormatKind) -> String {
    let generated = result.generated_at.format(TIMESTAMP_FORMAT);
    match kind {
        FormatKind::Markdown => format!(
            "| **Video** | `{id}` |\n\
             |---|---|\n\
             | **URL** | <{url}> |\n\
             | **Generated** | {generated} |\n\
             | **Model** | {model} |\n\
             \n\
             ---\n\
             \n\
             {body}\n",
            id = result.video_id,
            url = result.video_url,
            model = result.model_used,
            body = result.text.trim_end(),
        ),
        FormatKind::Plain => format!(
            "Video ID: {id}\n\
             Video URL: {url}\n\
             Generated: {generated}\n\
             Model: {model}\n\
             {separator}\n\
             \n\
             {body}\n",
            id = result.video_id,
            url = result.video_url,
            model = result.model_used,
            separator = "-".repeat(50),
            body = result.text.trim_end(),
        ),
    }
}

/// `summary_<id>_<YYYYmmdd_HHMMSS>.<ext>`, stamped with the generation time.
pub fn default_filename(result: &SummaryResult, kind: FormatKind) -> String {
    format!(
        "summary_{}_{}.{}",
        result.video_id,
        result.generated_at.format("%Y%m%d_%H%M%S"),
        kind.extension()
    )
}
