//! solc invocation.
//!
//! Builds the command line (and stdin payload) for an installed solc
//! binary and executes it. Exit codes are surfaced verbatim: the caller
//! decides whether a failure denotes a compile error or a tooling error.

use solx_core::{CommandRunner, Error, Result, Version};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of one solc invocation.
#[derive(Debug, Clone)]
pub struct SolcOutput {
    /// The full command line, for diagnostics.
    pub command: String,
    /// Exit code (0 = success).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl SolcOutput {
    /// Check if the invocation exited cleanly.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Builder for a single solc invocation.
#[derive(Debug, Clone)]
pub struct SolcCommand {
    binary: PathBuf,
    args: Vec<String>,
    stdin: Option<String>,
    verbose: bool,
}

impl SolcCommand {
    /// Create a command for a solc binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            stdin: None,
            verbose: false,
        }
    }

    /// Request the version banner.
    pub fn version(mut self) -> Self {
        self.args.push("--version".into());
        self
    }

    /// Request combined-JSON output for the given artifact kinds.
    pub fn combined_json(mut self, values: &[&str]) -> Self {
        self.args.push("--combined-json".into());
        self.args.push(values.join(","));
        self
    }

    /// Request standard-JSON mode (input supplied over stdin).
    pub fn standard_json(mut self) -> Self {
        self.args.push("--standard-json".into());
        self
    }

    /// Request library-linking mode.
    pub fn link(mut self, libraries: &[(String, String)]) -> Self {
        let libraries_arg: Vec<String> = libraries
            .iter()
            .map(|(name, address)| format!("{}:{}", name, address))
            .collect();
        self.args.push("--link".into());
        self.args.push("--libraries".into());
        self.args.push(libraries_arg.join(","));
        self
    }

    /// Enable the optimizer, optionally with a run count.
    pub fn optimize(mut self, runs: Option<u32>) -> Self {
        self.args.push("--optimize".into());
        if let Some(runs) = runs {
            self.args.push("--optimize-runs".into());
            self.args.push(runs.to_string());
        }
        self
    }

    /// Add import remappings (`prefix=path`).
    pub fn remappings<I, S>(mut self, remappings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(remappings.into_iter().map(Into::into));
        self
    }

    /// Add source file arguments.
    pub fn source_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.args.extend(
            files
                .into_iter()
                .map(|p| p.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Add a raw argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Supply a stdin payload.
    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Surface stderr in the logs.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The full command line, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.binary.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Execute the command. No retries; the exit code is returned as-is.
    pub async fn run(self) -> Result<SolcOutput> {
        let command = self.command_line();

        let mut runner = CommandRunner::new();
        if let Some(payload) = self.stdin {
            runner = runner.with_stdin(payload);
        }

        let args: Vec<&std::ffi::OsStr> = self.args.iter().map(|a| a.as_ref()).collect();
        let output = runner.run(self.binary.as_os_str(), args).await?;

        if self.verbose && !output.stderr.is_empty() {
            debug!(command = %command, "solc stderr:\n{}", output.stderr);
        }

        Ok(SolcOutput {
            command,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Get the version reported by a solc binary.
///
/// The banner carries a line like `Version: 0.8.1+commit.abc123`; the
/// build metadata after `+` is dropped.
pub async fn solc_version(binary: impl Into<PathBuf>) -> Result<Version> {
    let output = SolcCommand::new(binary).version().run().await?;

    Version::from_solc_output(&output.stdout).ok_or_else(|| Error::Compiler {
        message: "unable to extract version string from command output".into(),
        command: output.command,
        exit_code: Some(output.exit_code),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
