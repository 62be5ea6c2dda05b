//! CLI output formatting utilities.

use crate::youtube::{format_optional_duration, SearchResult};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

/// Output helper for CLI formatting.
///
/// Status lines go to stderr so stdout carries only the summary text.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        eprintln!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        eprintln!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a hint under an error.
    pub fn hint(msg: &str) {
        eprintln!("   {}", style(msg).dim());
    }

    /// Print a header.
    pub fn header(msg: &str) {
        eprintln!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        eprintln!("  {}: {}", style(key).dim(), value);
    }

    /// Print one numbered search hit.
    pub fn search_result(index: usize, result: &SearchResult) {
        let channel = result.channel.as_deref().unwrap_or("unknown channel");
        eprintln!(
            "  {} {} ({}, {})",
            style(format!("{:>2}.", index)).cyan(),
            style(&result.title).bold(),
            style(channel).dim(),
            format_optional_duration(result.duration)
        );
    }

    /// Write a streamed piece of summary text to stdout immediately.
    pub fn delta(text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
