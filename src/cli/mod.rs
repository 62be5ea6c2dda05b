//! CLI module for youtube-summariser.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::Overrides;
use crate::error::{ErrorKind, SummariserError};
use crate::formatter::FormatKind;
use clap::{Args, Parser, Subcommand};

/// Summarize YouTube videos with OpenAI, Anthropic or OpenRouter.
///
/// Fetches the transcript of a video and streams a structured summary
/// (TL;DR, main topics, key points, quotes, timestamps) to the terminal.
#[derive(Parser, Debug)]
#[command(name = "youtube-summariser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that produces a summary.
#[derive(Args, Debug, Clone)]
pub struct SummaryOptions {
    /// Write the summary to this file
    #[arg(short, long, conflicts_with = "no_save")]
    pub output: Option<String>,

    /// Print only, do not save a file
    #[arg(long)]
    pub no_save: bool,

    /// LLM provider (openai, anthropic, openrouter)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,

    /// Wait for the complete summary instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Output format (markdown, plain)
    #[arg(long, default_value = "markdown")]
    pub format: FormatKind,

    /// Save whatever was received if generation fails midway
    #[arg(long)]
    pub keep_partial: bool,
}

impl SummaryOptions {
    /// Per-run configuration overrides.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            stream: self.no_stream.then_some(false),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a video by URL or ID
    #[command(visible_alias = "summarize")]
    Summarise {
        /// YouTube URL or video ID
        url: String,

        #[command(flatten)]
        options: SummaryOptions,
    },

    /// Search for a video by title and summarize it
    Search {
        /// Search query
        query: String,

        /// Summarize the first result without asking
        #[arg(short = '1', long)]
        first: bool,

        /// Number of results to show
        #[arg(long, default_value = "5")]
        max_results: usize,

        #[command(flatten)]
        options: SummaryOptions,
    },

    /// Set up providers and API keys
    Init,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Start the web interface
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved configuration (keys masked)
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

/// Names accepted as the first argument.
const SUBCOMMANDS: &[&str] = &[
    "summarise", "summarize", "search", "init", "config", "serve", "help",
];

/// Treat `youtube-summariser <url> [flags]` as `youtube-summariser summarise <url> [flags]`.
///
/// Global flags before the URL are skipped over.
pub fn rewrite_bare_url(args: Vec<String>) -> Vec<String> {
    let mut position = 1;
    while position < args.len() {
        let arg = &args[position];
        if arg == "-c" || arg == "--config" {
            position += 2;
        } else if arg.starts_with('-') {
            position += 1;
        } else {
            break;
        }
    }

    let is_video = args.get(position).is_some_and(|first| {
        !SUBCOMMANDS.contains(&first.as_str()) && crate::youtube::extract_video_id(first).is_some()
    });

    let mut args = args;
    if is_video {
        args.insert(position, "summarise".to_string());
    }
    args
}

/// A next step to print under a fatal error.
pub fn error_hint(e: &SummariserError) -> Option<&'static str> {
    match e {
        SummariserError::Config(_) => Some(
            "Run 'youtube-summariser init' or set OPENAI_API_KEY, ANTHROPIC_API_KEY or OPENROUTER_API_KEY.",
        ),
        SummariserError::ToolNotFound(_) => {
            Some("Install yt-dlp: pip install yt-dlp (or brew install yt-dlp)")
        }
        SummariserError::Provider { source, .. } => match source.kind {
            ErrorKind::AuthError => Some("Check the API key for the selected provider."),
            ErrorKind::RateLimited => {
                Some("The provider is rate limiting requests. Wait a moment and retry.")
            }
            ErrorKind::NetworkError => Some("Check your internet connection."),
            ErrorKind::ModelNotFound => {
                Some("Check the model name. OpenRouter models look like 'provider/model-name'.")
            }
            ErrorKind::UnknownProviderError => None,
        },
        _ => None,
    }
}
