//! Versions command implementation.

use super::http_client;
use crate::output::Output;
use solx_core::{ExitCode, Result};
use solx_toolchain::{available_versions, Platform, VersionRegistry};

/// Run the versions command.
pub async fn run(
    installed_only: bool,
    platform: Platform,
    registry: &VersionRegistry,
    output: &Output,
) -> Result<ExitCode> {
    let installed = registry.installed()?;

    if installed_only {
        if installed.is_empty() {
            output.info("No solc versions installed");
        }
        for version in &installed {
            println!("{}", version);
        }
        return Ok(ExitCode::Success);
    }

    let client = http_client()?;
    let mut available = available_versions(&client, platform).await?;
    available.sort();

    for version in &available {
        if installed.contains(version) {
            println!("{} (installed)", version);
        } else {
            println!("{}", version);
        }
    }
    Ok(ExitCode::Success)
}
