//! Compiler output normalization.
//!
//! solc's combined-JSON mode nests artifacts per contract, with the ABI
//! embedded as a JSON string and the AST attached to the source file
//! entry rather than the contract. Normalization parses the ABI in
//! place and hoists the AST under the contract's own record.

use serde_json::Value;
use std::collections::BTreeMap;

/// Every artifact kind requested by default in combined-JSON mode.
pub const ALL_OUTPUT_VALUES: &[&str] = &[
    "abi",
    "asm",
    "ast",
    "bin",
    "bin-runtime",
    "devdoc",
    "opcodes",
    "userdoc",
];

/// Normalize combined-JSON output into a per-contract map.
///
/// Contract keys are `<source path>:<contract name>`. When a contract
/// carries an `abi` field as an embedded JSON string it is parsed into
/// a structured value; when the matching source entry carries an `AST`
/// it is hoisted into the contract record under `ast`.
pub fn normalize_combined(raw: &str) -> serde_json::Result<BTreeMap<String, Value>> {
    let output: Value = serde_json::from_str(raw)?;

    let sources = output.get("sources").cloned().unwrap_or(Value::Null);
    let mut contracts = BTreeMap::new();

    let Some(entries) = output.get("contracts").and_then(Value::as_object) else {
        return Ok(contracts);
    };

    for (path, data) in entries {
        let mut data = data.clone();

        if let Some(embedded) = data.get("abi").and_then(Value::as_str) {
            let abi: Value = serde_json::from_str(embedded)?;
            data["abi"] = abi;
        }

        // The AST lives on the source entry, keyed by the contract
        // path before the trailing `:<name>`.
        let source_key = path.rsplit_once(':').map_or(path.as_str(), |(key, _)| key);
        if let Some(ast) = sources.get(source_key).and_then(|s| s.get("AST")) {
            data["ast"] = ast.clone();
        }

        contracts.insert(path.clone(), data);
    }

    Ok(contracts)
}

/// Collect the formatted messages of error-severity diagnostics.
///
/// Returns `None` when the `errors` array is absent or carries only
/// warnings; those never fail a compilation.
pub fn error_messages(output: &Value) -> Option<String> {
    let errors = output.get("errors")?.as_array()?;

    let messages: Vec<&str> = errors
        .iter()
        .filter(|e| e.get("severity").and_then(Value::as_str) == Some("error"))
        .filter_map(|e| e.get("formattedMessage").and_then(Value::as_str))
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n"))
    }
}

/// Strip solc's completion marker from `--link` output.
pub fn strip_link_marker(stdout: &str) -> String {
    stdout.replace("Linking completed.", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_parses_embedded_abi_and_hoists_ast() {
        let raw = json!({
            "contracts": {
                "contracts/Token.sol:Token": {
                    "abi": "[{\"type\":\"function\",\"name\":\"transfer\"}]",
                    "bin": "6080"
                }
            },
            "sources": {
                "contracts/Token.sol": {
                    "AST": {"name": "SourceUnit", "children": []}
                }
            }
        })
        .to_string();

        let contracts = normalize_combined(&raw).unwrap();
        let token = &contracts["contracts/Token.sol:Token"];

        // Both land as structured values, not strings
        assert!(token["abi"].is_array());
        assert_eq!(token["abi"][0]["name"], "transfer");
        assert!(token["ast"].is_object());
        assert_eq!(token["ast"]["name"], "SourceUnit");
        assert_eq!(token["bin"], "6080");
    }

    #[test]
    fn test_normalize_empty_contracts() {
        let contracts = normalize_combined("{\"contracts\": {}}").unwrap();
        assert!(contracts.is_empty());
    }

    #[test]
    fn test_normalize_without_matching_source_entry() {
        let raw = json!({
            "contracts": {
                "contracts/Token.sol:Token": {"bin": "6080"}
            },
            "sources": {}
        })
        .to_string();

        let contracts = normalize_combined(&raw).unwrap();
        assert!(contracts["contracts/Token.sol:Token"].get("ast").is_none());
    }

    #[test]
    fn test_error_messages_ignores_warnings() {
        let output = json!({
            "errors": [
                {"severity": "warning", "formattedMessage": "unused variable"}
            ]
        });
        assert_eq!(error_messages(&output), None);
    }

    #[test]
    fn test_error_messages_joins_only_errors() {
        let output = json!({
            "errors": [
                {"severity": "warning", "formattedMessage": "W"},
                {"severity": "error", "formattedMessage": "X"},
                {"severity": "error", "formattedMessage": "Y"}
            ]
        });
        assert_eq!(error_messages(&output).as_deref(), Some("X\nY"));
    }

    #[test]
    fn test_error_messages_absent_errors_array() {
        assert_eq!(error_messages(&json!({"contracts": {}})), None);
    }

    #[test]
    fn test_strip_link_marker() {
        assert_eq!(
            strip_link_marker("6080beef...\nLinking completed.\n"),
            "6080beef..."
        );
    }
}
