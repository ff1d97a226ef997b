//! Environment variable constants for solx.
//!
//! This module defines all environment variables that solx recognizes,
//! providing a single source of truth for environment configuration.

/// Environment variable names used by solx.
pub struct EnvVars;

impl EnvVars {
    /// Override for the install root directory.
    pub const SOLX_BINARY_PATH: &'static str = "SOLX_BINARY_PATH";

    /// GitHub API token used to raise release-feed rate limits.
    pub const GITHUB_TOKEN: &'static str = "GITHUB_TOKEN";

    /// Enable verbose output.
    pub const SOLX_VERBOSE: &'static str = "SOLX_VERBOSE";

    /// Enable JSON log output.
    pub const SOLX_LOG_JSON: &'static str = "SOLX_LOG_JSON";

    /// Standard NO_COLOR environment variable.
    pub const NO_COLOR: &'static str = "NO_COLOR";

    /// CI environment indicator.
    pub const CI: &'static str = "CI";
}

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var(EnvVars::CI).is_ok()
}

/// Check if colors should be disabled based on environment.
pub fn no_color() -> bool {
    std::env::var(EnvVars::NO_COLOR).is_ok()
}
