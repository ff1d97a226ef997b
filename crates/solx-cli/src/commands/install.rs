//! Install command implementation.

use super::{http_client, parse_spec, VersionSpec};
use crate::output::Output;
use solx_core::{Error, ExitCode, Result};
use solx_toolchain::{available_versions, InstallCoordinator, InstallOptions, Platform, VersionRegistry};

/// Run the install command.
pub async fn run(
    spec: &str,
    allow_build: bool,
    no_progress: bool,
    platform: Platform,
    registry: &mut VersionRegistry,
    output: &Output,
) -> Result<ExitCode> {
    let version = match parse_spec(spec)? {
        VersionSpec::Exact(version) => version,
        VersionSpec::Pragma(range) => {
            // A pragma resolves against what upstream actually publishes
            output.status("Resolving", spec);
            let client = http_client()?;
            let available = available_versions(&client, platform).await?;
            range.select(&available).ok_or_else(|| {
                Error::config(format!("no available solc version satisfies '{}'", spec))
            })?
        }
    };

    output.status("Installing", &format!("solc {}", version));

    let coordinator = InstallCoordinator::for_platform(platform);
    let options = InstallOptions {
        allow_build,
        show_progress: !no_progress,
        ..Default::default()
    };
    let binary = coordinator.install(registry, &version, &options).await?;

    output.status("Installed", &format!("solc {} ({})", version, binary.display()));
    Ok(ExitCode::Success)
}
