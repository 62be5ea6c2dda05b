//! Summarise command implementation.

use super::resolve_config;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SummaryOptions};
use crate::config::EffectiveConfig;
use crate::formatter::{self, FormatKind};
use crate::orchestrator::{prepare_request, Orchestrator};
use crate::summary::{PromptRequest, SummaryResult};
use anyhow::Result;
use chrono::Local;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;

/// Run the summarise command.
pub async fn run_summarise(
    url: &str,
    options: &SummaryOptions,
    config_path: &Path,
    cancel: impl Future<Output = ()> + Send,
) -> Result<()> {
    // fail on configuration before touching the network
    let config = resolve_config(config_path, options)?;
    preflight::check(Operation::Summarise)?;

    let request = fetch_request(url).await?;
    generate(&request, &config, options, cancel).await
}

/// Fetch transcript and metadata behind a spinner.
pub(super) async fn fetch_request(url: &str) -> Result<PromptRequest> {
    let spinner = Output::spinner("Fetching transcript...");
    let request = prepare_request(url).await;
    spinner.finish_and_clear();
    let request = request?;

    if let Some(title) = &request.video_title {
        Output::kv("Title", title);
    }
    Output::kv("Video", &request.video.url);
    Ok(request)
}

/// Generate, print and save a summary for a prepared request.
pub(super) async fn generate(
    request: &PromptRequest,
    config: &EffectiveConfig,
    options: &SummaryOptions,
    cancel: impl Future<Output = ()> + Send,
) -> Result<()> {
    let orchestrator = Orchestrator::with_default_transport()?;
    Output::info(&format!("Generating summary with {}", config.model_used()));

    let spinner = Output::spinner("Waiting for the model...");
    let mut receiving = false;
    let mut sink = |delta: &str| {
        if !receiving {
            spinner.finish_and_clear();
            eprintln!();
            receiving = true;
        }
        Output::delta(delta);
    };

    let outcome = orchestrator
        .summarize_with_cancel(request, config, Some(&mut sink), cancel)
        .await;
    spinner.finish_and_clear();
    if receiving {
        println!();
    }

    match outcome {
        Ok(Some(result)) => {
            eprintln!();
            Output::success(&format!(
                "Summary generated in {:.1}s",
                result.elapsed_ms as f64 / 1000.0
            ));
            if let Some(path) = output_path(options, &result) {
                save(&path, &formatter::format(&result, options.format))?;
                Output::success(&format!("Saved to {}", path.display()));
            }
            Ok(())
        }
        Ok(None) => {
            eprintln!();
            Output::warning("Summary generation interrupted");
            Ok(())
        }
        Err(e) => {
            if options.keep_partial {
                if let Some(partial) = e.partial_text() {
                    let path = partial_path(&request.video.id, options.format);
                    save(&path, partial)?;
                    Output::warning(&format!("Partial summary saved to {}", path.display()));
                }
            }
            Err(e.into())
        }
    }
}

/// Where to save, or `None` with `--no-save`.
fn output_path(options: &SummaryOptions, result: &SummaryResult) -> Option<PathBuf> {
    if options.no_save {
        return None;
    }
    Some(match &options.output {
        Some(path) => PathBuf::from(shellexpand::tilde(path).to_string()),
        None => PathBuf::from(formatter::default_filename(result, options.format)),
    })
}

fn partial_path(video_id: &str, format: FormatKind) -> PathBuf {
    PathBuf::from(format!(
        "summary_{}_{}.partial.{}",
        video_id,
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

fn save(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    info!(path = %path.display(), bytes = content.len(), "Wrote summary");
    Ok(())
}
