//! Init command - interactive first-run setup.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{mask_key, ConfigDocument, ProviderKind};
use console::{style, Term};
use std::io;
use std::path::Path;

/// Run the init command: choose a provider, store its key and model.
pub fn run_init(config_path: &Path) -> anyhow::Result<()> {
    let term = Term::stderr();

    Output::header("youtube-summariser setup");
    eprintln!();

    // Step 1: Check prerequisites
    eprintln!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    eprintln!();
    match preflight::check(Operation::Summarise) {
        Ok(()) => Output::success("yt-dlp is installed."),
        Err(e) => {
            Output::warning(&e.to_string());
            Output::hint(install_hint());
            eprintln!();
            if !prompt_continue(&term, "Continue anyway?")? {
                Output::info(
                    "Setup cancelled. Install yt-dlp and run 'youtube-summariser init' again.",
                );
                return Ok(());
            }
        }
    }
    eprintln!();

    let mut document = ConfigDocument::load_from(config_path)?.unwrap_or_default();
    let defaults = ConfigDocument::bundled()?;

    // Step 2: Provider
    eprintln!("{}", style("Step 2: Choose a provider").bold().cyan());
    eprintln!();
    let current = document
        .provider
        .as_deref()
        .or(defaults.provider.as_deref())
        .and_then(|p| p.parse::<ProviderKind>().ok())
        .unwrap_or(ProviderKind::Anthropic);

    for (i, provider) in ProviderKind::ALL.iter().enumerate() {
        let marker = if *provider == current { " (current)" } else { "" };
        eprintln!("  {} {}{}", style(format!("{}.", i + 1)).cyan(), provider, style(marker).dim());
    }
    let provider = prompt_provider(&term, current)?;
    document.provider = Some(provider.to_string());
    eprintln!();

    // Step 3: API key
    eprintln!("{}", style("Step 3: API key").bold().cyan());
    eprintln!();
    if std::env::var(provider.api_key_env()).is_ok_and(|v| !v.trim().is_empty()) {
        Output::info(&format!(
            "{} is set in your environment and takes precedence over the config file.",
            provider.api_key_env()
        ));
    }
    let existing_key = document.section(provider).api_key.clone();
    let prompt = match &existing_key {
        Some(key) => format!("API key for {} [{}, Enter to keep]:", provider, mask_key(key)),
        None => format!("API key for {} (Enter to skip):", provider),
    };
    term.write_str(&format!("{} {} ", style("?").cyan(), prompt))?;
    let key = term.read_secure_line()?;
    if !key.trim().is_empty() {
        document.section_mut(provider).api_key = Some(key.trim().to_string());
    }
    eprintln!();

    // Step 4: Model
    eprintln!("{}", style("Step 4: Model").bold().cyan());
    eprintln!();
    let default_model = document
        .section(provider)
        .model
        .clone()
        .or_else(|| defaults.section(provider).model.clone())
        .unwrap_or_default();
    let model = prompt_with_default(&term, "Model", &default_model)?;
    if !model.is_empty() {
        document.section_mut(provider).model = Some(model);
    }
    eprintln!();

    document.save_to(config_path)?;
    Output::success(&format!("Saved configuration to {}", config_path.display()));

    if document.section(provider).api_key.is_none()
        && std::env::var(provider.api_key_env()).is_err()
    {
        Output::warning(&format!(
            "No API key configured for {}. Set {} before summarizing.",
            provider,
            provider.api_key_env()
        ));
    }

    eprintln!();
    eprintln!("{}", style("Setup Complete!").bold().green());
    eprintln!();
    eprintln!("Next steps:");
    eprintln!("  {} Summarize a video", style("youtube-summariser <url>").cyan());
    eprintln!("  {} Find a video by title", style("youtube-summariser search \"<query>\"").cyan());
    eprintln!("  {} Start the web interface", style("youtube-summariser serve").cyan());

    Ok(())
}

fn prompt_provider(term: &Term, current: ProviderKind) -> io::Result<ProviderKind> {
    loop {
        let answer = prompt_with_default(term, "Provider", current.as_str())?;
        match parse_provider_choice(&answer) {
            Some(provider) => return Ok(provider),
            None => Output::warning("Enter 1-3 or a provider name."),
        }
    }
}

/// Number from the list or a provider name.
fn parse_provider_choice(input: &str) -> Option<ProviderKind> {
    let input = input.trim();
    match input.parse::<usize>() {
        Ok(n) if (1..=ProviderKind::ALL.len()).contains(&n) => Some(ProviderKind::ALL[n - 1]),
        Ok(_) => None,
        Err(_) => input.parse().ok(),
    }
}

fn prompt_with_default(term: &Term, label: &str, default: &str) -> io::Result<String> {
    term.write_str(&format!(
        "{} {} {} ",
        style("?").cyan(),
        label,
        style(format!("[{}]", default)).dim()
    ))?;
    let input = term.read_line()?;
    let input = input.trim();
    Ok(if input.is_empty() {
        default.to_string()
    } else {
        input.to_string()
    })
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(term: &Term, message: &str) -> io::Result<bool> {
    term.write_str(&format!("{} {} {} ", style("?").cyan(), message, style("[y/N]").dim()))?;
    let input = term.read_line()?.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Get platform-specific install hint.
fn install_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
