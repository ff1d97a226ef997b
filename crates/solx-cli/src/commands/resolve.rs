//! Resolve command implementation.

use super::http_client;
use crate::output::Output;
use solx_core::{Error, ExitCode, Result};
use solx_toolchain::{available_versions, Platform, Range, VersionRegistry};

/// Run the resolve command.
///
/// Prints the selected version to stdout so the result can be consumed
/// by scripts.
pub async fn run(
    pragma: &str,
    installed_only: bool,
    platform: Platform,
    registry: &VersionRegistry,
    output: &Output,
) -> Result<ExitCode> {
    let range = Range::parse(pragma)
        .map_err(|e| Error::config(format!("invalid pragma '{}': {}", pragma, e)))?;

    let candidates = if installed_only {
        registry.installed()?
    } else {
        let client = http_client()?;
        available_versions(&client, platform).await?
    };

    let Some(selected) = range.select(&candidates) else {
        let source = if installed_only { "installed" } else { "available" };
        output.error(&format!(
            "no {} solc version satisfies '{}'",
            source, pragma
        ));
        return Ok(ExitCode::ToolchainError);
    };

    println!("{}", selected);
    Ok(ExitCode::Success)
}
