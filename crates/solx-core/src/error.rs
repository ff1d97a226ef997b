//! Error types for solx.

use std::path::PathBuf;

/// Result type alias using solx Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes for categorizing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Host OS is not Linux, macOS or Windows
    UnsupportedPlatform,
    /// Requested solc version is below the supported floor
    UnsupportedVersion,
    /// Release feed query failed
    CatalogFetch,
    /// Release asset download failed
    Download,
    /// Building solc from source failed
    BuildFailure,
    /// Operation requires a version that is not installed
    NotInstalled,
    /// Compilation produced no contracts
    ContractsNotFound,
    /// The compiler reported error-severity diagnostics
    CompilerError,
    /// Command execution failed
    CommandFailed,
    /// Invalid configuration
    ConfigError,
    /// Install lock error
    LockError,
    /// I/O error
    IoError,
}

/// A fix suggestion for an error.
#[derive(Debug, Clone)]
pub struct Fix {
    /// Description of what this fix does
    pub description: String,
    /// Command to run, if applicable
    pub command: Option<String>,
}

impl Fix {
    /// Create a fix with just a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: None,
        }
    }

    /// Create a fix with a command.
    pub fn with_command(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: Some(command.into()),
        }
    }
}

/// Structured error type for solx.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported platform: {os}/{arch} - solx supports Linux, macOS and Windows")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("solc {version} is not supported: solx requires solc {floor} or newer")]
    UnsupportedVersion { version: String, floor: String },

    #[error("status {status} when querying solc releases: {message}")]
    CatalogFetch {
        status: u16,
        message: String,
        fixes: Vec<Fix>,
    },

    #[error("received status {status} when attempting to download from {url}")]
    Download { url: String, status: u16 },

    #[error("`{step}` returned exit status {exit_code} while building solc from source")]
    Build {
        step: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
        fixes: Vec<Fix>,
    },

    #[error("solc {version} is not installed")]
    NotInstalled { version: String, fixes: Vec<Fix> },

    #[error("compilation produced no contracts")]
    ContractsNotFound {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("{message}")]
    Compiler {
        message: String,
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("command failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        fixes: Vec<Fix>,
    },

    #[error("configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        fixes: Vec<Fix>,
    },

    #[error("lock error: {message}")]
    Lock {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::UnsupportedPlatform { .. } => ErrorCode::UnsupportedPlatform,
            Error::UnsupportedVersion { .. } => ErrorCode::UnsupportedVersion,
            Error::CatalogFetch { .. } => ErrorCode::CatalogFetch,
            Error::Download { .. } => ErrorCode::Download,
            Error::Build { .. } => ErrorCode::BuildFailure,
            Error::NotInstalled { .. } => ErrorCode::NotInstalled,
            Error::ContractsNotFound { .. } => ErrorCode::ContractsNotFound,
            Error::Compiler { .. } => ErrorCode::CompilerError,
            Error::CommandFailed { .. } => ErrorCode::CommandFailed,
            Error::Config { .. } => ErrorCode::ConfigError,
            Error::Lock { .. } => ErrorCode::LockError,
            Error::Io { .. } | Error::Other(_) => ErrorCode::IoError,
        }
    }

    /// Get suggested fixes for this error.
    pub fn fixes(&self) -> &[Fix] {
        match self {
            Error::CatalogFetch { fixes, .. } => fixes,
            Error::Build { fixes, .. } => fixes,
            Error::NotInstalled { fixes, .. } => fixes,
            Error::CommandFailed { fixes, .. } => fixes,
            Error::Config { fixes, .. } => fixes,
            _ => &[],
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            path: None,
            source: None,
            fixes: vec![],
        }
    }

    /// Create a config error with a path.
    pub fn config_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::Config {
            message: message.into(),
            path: Some(path.into()),
            source: None,
            fixes: vec![],
        }
    }

    /// Create a not-installed error with the standard install hint.
    pub fn not_installed(version: impl Into<String>) -> Self {
        let version = version.into();
        let fix = Fix::with_command(
            format!("Install solc {}", version),
            format!("solx install {}", version),
        );
        Error::NotInstalled {
            version,
            fixes: vec![fix],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::UnsupportedVersion {
            version: "0.3.6".into(),
            floor: "0.4.11".into(),
        };
        assert_eq!(err.code(), ErrorCode::UnsupportedVersion);

        let err = Error::not_installed("0.8.1");
        assert_eq!(err.code(), ErrorCode::NotInstalled);
        assert_eq!(err.fixes().len(), 1);
        assert_eq!(err.fixes()[0].command.as_deref(), Some("solx install 0.8.1"));
    }

    #[test]
    fn test_compiler_error_message_is_verbatim() {
        let err = Error::Compiler {
            message: "X".into(),
            command: "solc --standard-json".into(),
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "X");
    }
}
