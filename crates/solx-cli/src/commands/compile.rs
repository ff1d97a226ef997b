//! Compile command implementation.

use super::{http_client, parse_spec, select_binary, VersionSpec};
use crate::output::Output;
use solx_core::{Error, ExitCode, Result};
use solx_compiler::{compile_files, compile_source, compile_standard, CompileOptions};
use solx_toolchain::VersionRegistry;
use std::io::Read;
use std::path::PathBuf;

/// Arguments for the compile command.
pub struct CompileArgs {
    pub files: Vec<PathBuf>,
    pub use_version: Option<String>,
    pub standard_json: bool,
    pub optimize: bool,
    pub optimize_runs: Option<u32>,
    pub remap: Vec<String>,
    pub output_values: Option<String>,
    pub allow_empty: bool,
    pub check_new: bool,
}

/// Run the compile command. Artifacts go to stdout as pretty JSON.
pub async fn run(
    args: CompileArgs,
    registry: &mut VersionRegistry,
    output: &Output,
) -> Result<ExitCode> {
    let binary = select_binary(registry, args.use_version.as_deref())?;

    // Opt-in: tell the user when a newer release would also satisfy
    // the pragma. Failures here never fail the compile.
    if args.check_new {
        if let Some(VersionSpec::Pragma(range)) =
            args.use_version.as_deref().map(parse_spec).transpose()?
        {
            let client = http_client()?;
            if let Err(e) = registry.report_newer_available(&client, &range).await {
                tracing::warn!("could not check for newer solc releases: {}", e);
            }
        }
    }

    if args.standard_json {
        let input = read_input(args.files.first())?;
        let document: serde_json::Value = serde_json::from_str(&input)
            .map_err(|e| Error::config(format!("invalid standard-JSON input: {}", e)))?;
        let result = compile_standard(&binary, &document, args.allow_empty).await?;
        println!("{}", to_pretty(&result)?);
        return Ok(ExitCode::Success);
    }

    let options = CompileOptions {
        output_values: args
            .output_values
            .map(|v| v.split(',').map(str::to_string).collect()),
        optimize: args.optimize,
        optimize_runs: args.optimize_runs,
        remappings: args.remap,
        allow_empty: args.allow_empty,
    };

    let contracts = if args.files.is_empty() {
        output.status("Compiling", "<stdin>");
        let source = read_input(None)?;
        compile_source(&binary, source, &options).await?
    } else {
        output.status("Compiling", &format!("{} file(s)", args.files.len()));
        compile_files(&binary, &args.files, &options).await?
    };

    println!("{}", to_pretty(&contracts)?);
    Ok(ExitCode::Success)
}

/// Read from a file, or from stdin when no path is given.
pub(crate) fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: "failed to read input file".into(),
            path: Some(path.clone()),
            source: e,
        }),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| Error::Io {
                    message: "failed to read stdin".into(),
                    path: None,
                    source: e,
                })?;
            Ok(buffer)
        }
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::config(format!("failed to render output: {}", e)))
}
