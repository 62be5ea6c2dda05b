//! CLI command implementations.

mod config;
mod init;
mod search;
mod serve;
mod summarise;

pub use config::run_config;
pub use init::run_init;
pub use search::run_search;
pub use serve::run_serve;
pub use summarise::run_summarise;

use crate::cli::SummaryOptions;
use crate::config::{ConfigDocument, ConfigResolver, EffectiveConfig};
use std::path::{Path, PathBuf};

/// The config file in use: `--config` with `~` expanded, or the default location.
pub fn config_path(cli_value: Option<&str>) -> PathBuf {
    cli_value
        .map(ConfigDocument::expand_path)
        .unwrap_or_else(ConfigDocument::default_config_path)
}

/// Resolve provider settings for one summary run.
fn resolve_config(path: &Path, options: &SummaryOptions) -> crate::Result<EffectiveConfig> {
    ConfigResolver::standard(Some(path))?.resolve(&options.overrides())
}
