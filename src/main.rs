//! youtube-summariser CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use youtube_summariser::cli::{self, commands, Cli, Commands, Output};
use youtube_summariser::SummariserError;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_from(cli::rewrite_bare_url(std::env::args().collect()));

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("youtube_summariser={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::error(&format!("{:#}", e));
            if let Some(hint) = e.downcast_ref::<SummariserError>().and_then(cli::error_hint) {
                Output::hint(hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = commands::config_path(cli.config.as_deref());

    // Execute command
    match &cli.command {
        Commands::Summarise { url, options } => {
            commands::run_summarise(url, options, &config_path, interrupted()).await?;
        }

        Commands::Search {
            query,
            first,
            max_results,
            options,
        } => {
            commands::run_search(
                query,
                *first,
                *max_results,
                options,
                &config_path,
                interrupted(),
            )
            .await?;
        }

        Commands::Init => {
            commands::run_init(&config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &config_path)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, config_path).await?;
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C. Never resolves if the signal handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
