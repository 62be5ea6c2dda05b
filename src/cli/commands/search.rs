//! Search command implementation.

use super::resolve_config;
use super::summarise::{fetch_request, generate};
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SummaryOptions};
use crate::youtube::search_videos;
use anyhow::Result;
use console::{style, Term};
use std::future::Future;
use std::path::Path;

/// Run the search command: find videos by title, pick one, summarize it.
pub async fn run_search(
    query: &str,
    first: bool,
    max_results: usize,
    options: &SummaryOptions,
    config_path: &Path,
    cancel: impl Future<Output = ()> + Send,
) -> Result<()> {
    let config = resolve_config(config_path, options)?;
    preflight::check(Operation::Search)?;

    let spinner = Output::spinner(&format!("Searching for \"{}\"...", query));
    let results = search_videos(query, max_results).await;
    spinner.finish_and_clear();
    let results = results?;

    if results.is_empty() {
        Output::warning(&format!("No videos found for \"{}\"", query));
        return Ok(());
    }

    let chosen = if first {
        &results[0]
    } else {
        Output::header(&format!("Results for \"{}\"", query));
        for (i, result) in results.iter().enumerate() {
            Output::search_result(i + 1, result);
        }
        eprintln!();

        let count = results.len();
        let selection = tokio::task::spawn_blocking(move || prompt_selection(count)).await??;
        match selection {
            Some(index) => &results[index],
            None => {
                Output::info("No video selected.");
                return Ok(());
            }
        }
    };

    Output::info(&format!("Selected: {}", chosen.title));
    let request = fetch_request(&chosen.url).await?;
    generate(&request, &config, options, cancel).await
}

fn prompt_selection(count: usize) -> std::io::Result<Option<usize>> {
    let term = Term::stderr();
    loop {
        term.write_str(&format!(
            "{} Select a video {} ",
            style("?").cyan(),
            style(format!("[1-{}, Enter to cancel]", count)).dim()
        ))?;
        let input = term.read_line()?;
        if input.trim().is_empty() {
            return Ok(None);
        }
        match parse_selection(&input, count) {
            Some(index) => return Ok(Some(index)),
            None => Output::warning(&format!("Please enter a number from 1 to {}", count)),
        }
    }
}

/// 1-based user input to a 0-based index.
fn parse_selection(input: &str, count: usize) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1", 5), Some(0));
        assert_eq!(parse_selection(" 5\n", 5), Some(4));
        assert_eq!(parse_selection("0", 5), None);
        assert_eq!(parse_selection("6", 5), None);
        assert_eq!(parse_selection("two", 5), None);
    }
}
