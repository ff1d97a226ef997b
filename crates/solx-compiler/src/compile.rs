//! High-level compilation operations.
//!
//! Each operation takes the path of an installed solc binary, builds the
//! invocation, runs it, and normalizes the output. Version selection is
//! the registry's job; nothing here picks a binary implicitly.

use crate::output::{self, ALL_OUTPUT_VALUES};
use crate::wrapper::{SolcCommand, SolcOutput};
use serde_json::Value;
use solx_core::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Options shared by the combined-JSON compilation operations.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Artifact kinds to request. Defaults to every known kind.
    pub output_values: Option<Vec<String>>,
    /// Enable the optimizer.
    pub optimize: bool,
    /// Optimizer run count (implies `optimize`).
    pub optimize_runs: Option<u32>,
    /// Import remappings (`prefix=path`).
    pub remappings: Vec<String>,
    /// Accept output with no contracts instead of failing.
    pub allow_empty: bool,
}

impl CompileOptions {
    fn apply(&self, mut cmd: SolcCommand) -> SolcCommand {
        let values: Vec<&str> = match &self.output_values {
            Some(values) => values.iter().map(String::as_str).collect(),
            None => ALL_OUTPUT_VALUES.to_vec(),
        };
        cmd = cmd.combined_json(&values);

        if self.optimize || self.optimize_runs.is_some() {
            cmd = cmd.optimize(self.optimize_runs);
        }
        cmd.remappings(self.remappings.iter().cloned())
    }
}

/// Compile Solidity source code supplied as a string.
///
/// The source is fed to solc over stdin and the combined-JSON output is
/// normalized into a per-contract artifact map.
pub async fn compile_source(
    binary: impl AsRef<Path>,
    source: impl Into<String>,
    options: &CompileOptions,
) -> Result<BTreeMap<String, Value>> {
    let cmd = options
        .apply(SolcCommand::new(binary.as_ref()))
        .stdin(source)
        .arg("-");
    run_combined(cmd, options.allow_empty).await
}

/// Compile Solidity source files.
pub async fn compile_files<I, P>(
    binary: impl AsRef<Path>,
    files: I,
    options: &CompileOptions,
) -> Result<BTreeMap<String, Value>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let cmd = options
        .apply(SolcCommand::new(binary.as_ref()))
        .source_files(files);
    run_combined(cmd, options.allow_empty).await
}

async fn run_combined(cmd: SolcCommand, allow_empty: bool) -> Result<BTreeMap<String, Value>> {
    let output = cmd.run().await?;
    if !output.success() {
        return Err(compiler_error(failure_message(&output), &output));
    }

    let contracts = output::normalize_combined(&output.stdout)
        .map_err(|e| compiler_error(format!("solc produced unparseable output: {}", e), &output))?;

    if contracts.is_empty() && !allow_empty {
        return Err(Error::ContractsNotFound {
            command: output.command,
            exit_code: Some(output.exit_code),
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }
    Ok(contracts)
}

/// Compile via solc's standard-JSON interface.
///
/// The input document goes over stdin and the full output document is
/// returned. An input with no sources fails before solc runs unless
/// `allow_empty` is set. Error-severity diagnostics fail the call;
/// warnings are left in the output for the caller.
pub async fn compile_standard(
    binary: impl AsRef<Path>,
    input: &Value,
    allow_empty: bool,
) -> Result<Value> {
    let has_sources = input
        .get("sources")
        .and_then(Value::as_object)
        .is_some_and(|sources| !sources.is_empty());
    if !has_sources && !allow_empty {
        return Err(Error::ContractsNotFound {
            command: format!("{} --standard-json", binary.as_ref().display()),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        });
    }

    let payload = serde_json::to_string(input)
        .map_err(|e| Error::config(format!("invalid standard-JSON input: {}", e)))?;

    let output = SolcCommand::new(binary.as_ref())
        .standard_json()
        .stdin(payload)
        .run()
        .await?;
    if !output.success() {
        return Err(compiler_error(failure_message(&output), &output));
    }

    let document: Value = serde_json::from_str(&output.stdout)
        .map_err(|e| compiler_error(format!("solc produced unparseable output: {}", e), &output))?;

    if let Some(message) = output::error_messages(&document) {
        return Err(compiler_error(message, &output));
    }
    Ok(document)
}

/// Link placeholder library references in unlinked bytecode.
///
/// `libraries` pairs fully qualified library names with addresses. The
/// linked bytecode is returned with solc's completion marker removed.
pub async fn link_code(
    binary: impl AsRef<Path>,
    unlinked: impl Into<String>,
    libraries: &[(String, String)],
) -> Result<String> {
    let output = SolcCommand::new(binary.as_ref())
        .link(libraries)
        .stdin(unlinked)
        .run()
        .await?;
    if !output.success() {
        return Err(compiler_error(failure_message(&output), &output));
    }
    Ok(output::strip_link_marker(&output.stdout))
}

fn failure_message(output: &SolcOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        format!("solc exited with status {}", output.exit_code)
    } else {
        stderr.to_string()
    }
}

fn compiler_error(message: String, output: &SolcOutput) -> Error {
    Error::Compiler {
        message,
        command: output.command.clone(),
        exit_code: Some(output.exit_code),
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    /// Write a stand-in solc that drains stdin and emits a fixed payload.
    fn fake_solc(dir: &Path, stdout: &str, exit_code: i32) -> PathBuf {
        let script = dir.join("solc");
        let body = format!(
            "#!/bin/sh\ncat > /dev/null\nprintf '%s' '{}'\nexit {}\n",
            stdout.replace('\'', "'\\''"),
            exit_code
        );
        std::fs::write(&script, body).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        script
    }

    #[tokio::test]
    async fn test_compile_source_normalizes_contracts() {
        let payload = json!({
            "contracts": {
                "<stdin>:Greeter": {
                    "abi": "[]",
                    "bin": "6080"
                }
            },
            "sources": {
                "<stdin>": {"AST": {"name": "SourceUnit"}}
            }
        })
        .to_string();

        let dir = tempfile::tempdir().unwrap();
        let solc = fake_solc(dir.path(), &payload, 0);

        let contracts = compile_source(&solc, "contract Greeter {}", &CompileOptions::default())
            .await
            .unwrap();
        let greeter = &contracts["<stdin>:Greeter"];
        assert!(greeter["abi"].is_array());
        assert_eq!(greeter["ast"]["name"], "SourceUnit");
    }

    #[tokio::test]
    async fn test_empty_output_is_contracts_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let solc = fake_solc(dir.path(), "{\"contracts\": {}}", 0);

        let err = compile_source(&solc, "pragma solidity ^0.8.0;", &CompileOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ContractsNotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_output_accepted_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let solc = fake_solc(dir.path(), "{\"contracts\": {}}", 0);

        let options = CompileOptions {
            allow_empty: true,
            ..Default::default()
        };
        let contracts = compile_source(&solc, "pragma solidity ^0.8.0;", &options)
            .await
            .unwrap();
        assert!(contracts.is_empty());
    }

    #[tokio::test]
    async fn test_standard_json_error_severity_fails() {
        let payload = json!({
            "errors": [
                {"severity": "error", "formattedMessage": "X"}
            ]
        })
        .to_string();

        let dir = tempfile::tempdir().unwrap();
        let solc = fake_solc(dir.path(), &payload, 0);

        let input = json!({
            "language": "Solidity",
            "sources": {"a.sol": {"content": "contract A {}"}}
        });
        let err = compile_standard(&solc, &input, false).await.unwrap_err();
        // The joined diagnostics become the error message, verbatim
        assert_eq!(err.to_string(), "X");
    }

    #[tokio::test]
    async fn test_standard_json_rejects_empty_sources() {
        let dir = tempfile::tempdir().unwrap();
        let solc = fake_solc(dir.path(), "{}", 0);

        for input in [json!({"language": "Solidity"}), json!({"sources": {}})] {
            let err = compile_standard(&solc, &input, false).await.unwrap_err();
            assert!(matches!(err, Error::ContractsNotFound { .. }));
        }

        // Explicitly allowed, the same input reaches solc
        let document = compile_standard(&solc, &json!({"sources": {}}), true)
            .await
            .unwrap();
        assert!(document.is_object());
    }

    #[tokio::test]
    async fn test_standard_json_warnings_pass_through() {
        let payload = json!({
            "errors": [
                {"severity": "warning", "formattedMessage": "unused variable"}
            ],
            "contracts": {}
        })
        .to_string();

        let dir = tempfile::tempdir().unwrap();
        let solc = fake_solc(dir.path(), &payload, 0);

        let input = json!({
            "language": "Solidity",
            "sources": {"a.sol": {"content": "contract A {}"}}
        });
        let document = compile_standard(&solc, &input, false).await.unwrap();
        assert_eq!(document["errors"][0]["severity"], "warning");
    }

    #[tokio::test]
    async fn test_link_code_strips_marker() {
        let dir = tempfile::tempdir().unwrap();
        let solc = fake_solc(dir.path(), "6080deadbeef\nLinking completed.\n", 0);

        let libraries = vec![("lib.sol:Math".to_string(), "0xdead".to_string())];
        let linked = link_code(&solc, "6080__lib.sol:Math____________", &libraries)
            .await
            .unwrap();
        assert_eq!(linked, "6080deadbeef");
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("solc");
        std::fs::write(
            &script,
            "#!/bin/sh\ncat > /dev/null\necho 'ParserError: Expected pragma' >&2\nexit 1\n",
        )
        .unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let err = compile_source(&script, "garbage", &CompileOptions::default())
            .await
            .unwrap_err();
        match err {
            Error::Compiler {
                message, exit_code, ..
            } => {
                assert!(message.contains("ParserError"));
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
