//! youtube-summariser - AI summaries of YouTube videos
//!
//! Fetches a video's transcript and streams a structured summary from OpenAI,
//! Anthropic or OpenRouter, from the command line or a small web form.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Layered provider settings (environment, user file, bundled defaults)
//! - `llm` - Provider adapters behind one streaming interface
//! - `orchestrator` - Drives a single summarization request
//! - `formatter` - Markdown and plain-text rendering
//! - `youtube` - URL parsing, transcripts and search via yt-dlp
//! - `cli` - Command-line and web front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use youtube_summariser::config::{ConfigResolver, Overrides};
//! use youtube_summariser::orchestrator::{prepare_request, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigResolver::standard(None)?.resolve(&Overrides::default())?;
//!     let request = prepare_request("https://youtu.be/dQw4w9WgXcQ").await?;
//!
//!     let orchestrator = Orchestrator::with_default_transport()?;
//!     let mut print = |delta: &str| print!("{}", delta);
//!     let result = orchestrator.summarize(&request, &config, Some(&mut print)).await?;
//!     println!("\n({} ms)", result.elapsed_ms);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod llm;
pub mod orchestrator;
pub mod summary;
pub mod youtube;

pub use error::{Result, SummariserError};
