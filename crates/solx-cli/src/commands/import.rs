//! Import command implementation.

use crate::output::Output;
use solx_core::{ExitCode, Result};
use solx_toolchain::VersionRegistry;

/// Run the import command: pick up solc binaries already on the system.
pub async fn run(registry: &VersionRegistry, output: &Output) -> Result<ExitCode> {
    output.status("Scanning", "for system solc binaries");

    let imported = registry.import_installed().await?;

    if imported.is_empty() {
        output.info("No new solc binaries found");
    } else {
        for version in &imported {
            output.list_item("imported", &version.to_string());
        }
        output.status("Imported", &format!("{} version(s)", imported.len()));
    }
    Ok(ExitCode::Success)
}
