//! Core types for solx.
//!
//! This crate provides shared types, error handling, and command execution
//! utilities used across all solx crates.

pub mod command;
pub mod env;
pub mod error;
pub mod version;

pub use command::{CommandOutput, CommandRunner};
pub use env::EnvVars;
pub use error::{Error, ErrorCode, Fix, Result};
pub use version::{Version, MINIMUM_SOLC_VERSION};

/// Exit codes for the solx CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    GeneralError = 1,
    /// Usage error (bad arguments)
    UsageError = 2,
    /// Install or version-selection error
    ToolchainError = 3,
    /// Compilation failure
    CompileError = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
