//! Link command implementation.

use super::{compile::read_input, select_binary};
use solx_core::{Error, ExitCode, Result};
use solx_compiler::link_code;
use solx_toolchain::VersionRegistry;
use std::path::PathBuf;

/// Run the link command. The linked bytecode goes to stdout.
pub async fn run(
    file: Option<PathBuf>,
    libraries: &[String],
    use_version: Option<&str>,
    registry: &mut VersionRegistry,
) -> Result<ExitCode> {
    let binary = select_binary(registry, use_version)?;

    let libraries = libraries
        .iter()
        .map(|spec| {
            spec.split_once('=')
                .map(|(name, address)| (name.to_string(), address.to_string()))
                .ok_or_else(|| {
                    Error::config(format!(
                        "invalid library '{}': expected NAME=ADDRESS",
                        spec
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let unlinked = read_input(file.as_ref())?;
    let linked = link_code(&binary, unlinked.trim().to_string(), &libraries).await?;

    println!("{}", linked);
    Ok(ExitCode::Success)
}
