//! Summarization request and result types.

use crate::config::prompts::{self, SUMMARY_SYSTEM_PROMPT, SUMMARY_USER_PROMPT};
use crate::error::{Result, SummariserError};
use crate::youtube::format_duration;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Average speaking rate used to estimate length when the duration is unknown.
const SPOKEN_WORDS_PER_MINUTE: f64 = 150.0;
/// Summary words per minute of video (~50 words per 5 minutes).
const SUMMARY_WORDS_PER_MINUTE: f64 = 10.0;
const MIN_SUMMARY_WORDS: u32 = 150;

/// The video a transcript belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRef {
    pub id: String,
    pub url: String,
}

impl VideoRef {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// A single summarization ask.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub video: VideoRef,
    pub transcript: String,
    pub video_title: Option<String>,
    pub video_duration: Option<Duration>,
    /// System prompt template.
    pub instructions: String,
}

impl PromptRequest {
    /// Create a request. The transcript must contain text.
    pub fn new(video: VideoRef, transcript: impl Into<String>) -> Result<Self> {
        let transcript = transcript.into();
        if transcript.trim().is_empty() {
            return Err(SummariserError::InvalidInput(format!(
                "Empty transcript for video {}",
                video.id
            )));
        }

        Ok(Self {
            video,
            transcript,
            video_title: None,
            video_duration: None,
            instructions: SUMMARY_SYSTEM_PROMPT.to_string(),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.video_title = Some(title.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.video_duration = Some(duration);
        self
    }

    /// Target length of the detailed summary, scaled with the video length.
    pub fn target_words(&self) -> u32 {
        let minutes = match self.video_duration {
            Some(d) => d.as_secs_f64() / 60.0,
            None => self.transcript.split_whitespace().count() as f64 / SPOKEN_WORDS_PER_MINUTE,
        };
        let words = (minutes * SUMMARY_WORDS_PER_MINUTE).round() as u32;
        // nearest 50
        ((words + 25) / 50 * 50).max(MIN_SUMMARY_WORDS)
    }

    /// Rendered system prompt.
    pub fn system_prompt(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("target_words".to_string(), self.target_words().to_string());
        prompts::render(&self.instructions, &vars)
    }

    /// Rendered user message: optional title/duration context plus the transcript.
    pub fn user_message(&self) -> String {
        let mut context = String::new();
        if let Some(title) = &self.video_title {
            context.push_str(&format!("Video title: {}\n", title));
        }
        if let Some(duration) = self.video_duration {
            context.push_str(&format!("Duration: {}\n", format_duration(duration.as_secs())));
        }
        if !context.is_empty() {
            context.push('\n');
        }

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        vars.insert("transcript".to_string(), self.transcript.clone());
        prompts::render(SUMMARY_USER_PROMPT, &vars)
    }
}

/// The finished summary. Owned by the caller once returned.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub text: String,
    /// "provider / model".
    pub model_used: String,
    pub generated_at: DateTime<Local>,
    pub video_id: String,
    pub video_url: String,
    pub elapsed_ms: u64,
}
