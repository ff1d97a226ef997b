//! Command implementations.

mod compile;
mod import;
mod install;
mod link;
mod resolve;
mod versions;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::output::{Output, Verbosity};
use solx_core::{Error, ErrorCode, ExitCode, Result, Version};
use solx_toolchain::{install_root, Platform, Range, VersionRegistry};

/// Run the CLI command, mapping errors to exit codes.
pub async fn run(cli: Cli) -> i32 {
    let output = Output::with_verbosity(if cli.global.verbose {
        Verbosity::Verbose
    } else if cli.global.quiet {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    });

    let result = dispatch(cli, &output).await;
    output.flush();

    match result {
        Ok(code) => code.into(),
        Err(error) => {
            output.print_error(&error);
            exit_code(&error).into()
        }
    }
}

async fn dispatch(cli: Cli, output: &Output) -> Result<ExitCode> {
    let (platform, mut registry) = open_registry(&cli.global)?;

    match cli.command {
        Commands::Install {
            version_or_pragma,
            allow_build,
            no_progress,
        } => {
            install::run(
                &version_or_pragma,
                allow_build,
                no_progress || cli.global.quiet,
                platform,
                &mut registry,
                output,
            )
            .await
        }
        Commands::Versions { installed } => {
            versions::run(installed, platform, &registry, output).await
        }
        Commands::Resolve { pragma, installed } => {
            resolve::run(&pragma, installed, platform, &registry, output).await
        }
        Commands::Compile {
            files,
            use_version,
            standard_json,
            optimize,
            optimize_runs,
            remap,
            output_values,
            allow_empty,
            check_new,
        } => {
            let args = compile::CompileArgs {
                files,
                use_version,
                standard_json,
                optimize,
                optimize_runs,
                remap,
                output_values,
                allow_empty,
                check_new,
            };
            compile::run(args, &mut registry, output).await
        }
        Commands::Link {
            file,
            libraries,
            use_version,
        } => link::run(file, &libraries, use_version.as_deref(), &mut registry).await,
        Commands::Import => import::run(&registry, output).await,
    }
}

/// Resolve the platform and open the version registry.
fn open_registry(global: &GlobalArgs) -> Result<(Platform, VersionRegistry)> {
    let platform = Platform::current()?;
    let root = install_root(global.solc_dir.as_deref())?;
    Ok((platform, VersionRegistry::new(root, platform)))
}

/// A version argument: either an exact version or a pragma range.
pub(crate) enum VersionSpec {
    Exact(Version),
    Pragma(Range),
}

/// Parse a version-or-pragma argument.
pub(crate) fn parse_spec(spec: &str) -> Result<VersionSpec> {
    if let Ok(version) = spec.parse::<Version>() {
        return Ok(VersionSpec::Exact(version));
    }
    let range = Range::parse(spec)
        .map_err(|e| Error::config(format!("invalid version or pragma '{}': {}", spec, e)))?;
    Ok(VersionSpec::Pragma(range))
}

/// Select the solc binary to run with, making the selection active.
///
/// With no explicit spec the newest installed version is used.
pub(crate) fn select_binary(
    registry: &mut VersionRegistry,
    spec: Option<&str>,
) -> Result<std::path::PathBuf> {
    match spec {
        Some(spec) => match parse_spec(spec)? {
            VersionSpec::Exact(version) => registry.set_active(version)?,
            VersionSpec::Pragma(range) => {
                registry.set_active_by_range(&range)?;
            }
        },
        None => {
            let installed = registry.installed()?;
            let latest = installed.into_iter().next_back().ok_or_else(|| {
                let fix = solx_core::Fix::with_command(
                    "Install a solc version first",
                    "solx install <version>",
                );
                Error::NotInstalled {
                    version: "<none>".into(),
                    fixes: vec![fix],
                }
            })?;
            registry.set_active(latest)?;
        }
    }
    registry.active_executable()
}

/// Shared HTTP client for release-feed queries.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("solx")
        .build()
        .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))
}

fn exit_code(error: &Error) -> ExitCode {
    match error.code() {
        ErrorCode::CompilerError | ErrorCode::ContractsNotFound => ExitCode::CompileError,
        ErrorCode::ConfigError => ExitCode::UsageError,
        ErrorCode::IoError => ExitCode::GeneralError,
        _ => ExitCode::ToolchainError,
    }
}
