//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::{mask_key, ConfigDocument, ConfigResolver, Overrides};
use anyhow::Result;
use std::path::Path;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => show(config_path)?,

        ConfigAction::Edit => {
            // Start from the bundled defaults so every option is visible
            if !config_path.exists() {
                ConfigDocument::bundled()?.save_to(config_path)?;
                Output::info(&format!("Created config at {}", config_path.display()));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
            Output::info(&format!("Opening config in {}...", editor));

            match std::process::Command::new(&editor).arg(config_path).status() {
                Ok(s) if s.success() => {
                    // Surface syntax errors now rather than on the next run
                    match ConfigDocument::load_from(config_path) {
                        Ok(_) => Output::success("Config saved."),
                        Err(e) => Output::warning(&e.to_string()),
                    }
                }
                Ok(_) => Output::warning("Editor exited with non-zero status."),
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {}", config_path.display()));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

fn show(config_path: &Path) -> Result<()> {
    Output::header("Config file");
    match ConfigDocument::load_from(config_path)? {
        Some(document) => {
            Output::kv("Path", &config_path.display().to_string());
            let toml_str = toml::to_string_pretty(&document.redacted())
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }
        None => Output::kv("Path", &format!("{} (not created)", config_path.display())),
    }

    Output::header("Effective settings");
    match ConfigResolver::standard(Some(config_path))?.resolve(&Overrides::default()) {
        Ok(config) => {
            Output::kv("Provider", config.provider.as_str());
            Output::kv("Model", &config.model);
            Output::kv("API key", &mask_key(&config.api_key));
            Output::kv("Max tokens", &config.max_tokens.to_string());
            Output::kv("Endpoint", &config.base_url);
        }
        Err(e) => Output::warning(&e.to_string()),
    }
    Ok(())
}
