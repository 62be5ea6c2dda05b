//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools are available before work starts that would
//! otherwise fail midway.

use crate::error::{Result, SummariserError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching transcripts needs yt-dlp.
    Summarise,
    /// Searching needs yt-dlp.
    Search,
    /// The web server fetches transcripts on request.
    Serve,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Summarise | Operation::Search | Operation::Serve => check_tool("yt-dlp"),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SummariserError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SummariserError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SummariserError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let err = check_tool("definitely-not-a-real-tool-7f3a").unwrap_err();
        assert!(matches!(
            err,
            SummariserError::ToolNotFound(name) if name == "definitely-not-a-real-tool-7f3a"
        ));
    }
}
