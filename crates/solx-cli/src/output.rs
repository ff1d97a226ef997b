//! Output formatting for the solx CLI.

use crate::style::Style;
use solx_core::{Error, Fix};
use std::io::{self, Write};

/// Verbosity level for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Verbose output - includes underlying tool output
    Verbose,
}

/// Output handler for consistent CLI output.
#[derive(Debug, Clone)]
pub struct Output {
    verbosity: Verbosity,
}

impl Default for Output {
    fn default() -> Self {
        Self::with_verbosity(Verbosity::Normal)
    }
}

impl Output {
    /// Create an output handler with specified verbosity.
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Check if verbose output is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbosity >= Verbosity::Verbose
    }

    /// Print a status message with a step title.
    pub fn status(&self, action: &str, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{:>12} {}", Style::bold(Style::success(action)), message);
        }
    }

    /// Print an info message.
    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{}", message);
        }
    }

    /// Print a warning message.
    pub fn warn(&self, message: &str) {
        eprintln!("{}: {}", Style::warning("warning"), message);
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        eprintln!("{}: {}", Style::error("error"), message);
    }

    /// Print a structured error with fixes.
    pub fn print_error(&self, error: &Error) {
        eprintln!();
        eprintln!("{}: {}", Style::error("error"), error);

        // Print context if available
        match error {
            Error::Config { path: Some(p), .. } => {
                eprintln!("  {} {}", Style::dim("-->"), p.display());
            }
            Error::Io { path: Some(p), .. } => {
                eprintln!("  {} {}", Style::dim("-->"), p.display());
            }
            Error::Compiler {
                command, exit_code, ..
            } => {
                eprintln!("  {} {}", Style::dim("command:"), command);
                if let Some(code) = exit_code {
                    eprintln!("  {} {}", Style::dim("exit code:"), code);
                }
            }
            Error::Build { stderr, .. } if !stderr.trim().is_empty() => {
                eprintln!("  {} {}", Style::dim("stderr:"), stderr.trim());
            }
            _ => {}
        }

        let fixes = error.fixes();
        if !fixes.is_empty() {
            eprintln!();
            for fix in fixes {
                self.print_fix(fix);
            }
        }
    }

    /// Print a fix suggestion.
    pub fn print_fix(&self, fix: &Fix) {
        if let Some(ref cmd) = fix.command {
            eprintln!("{}: Run `{}`", Style::info("fix"), Style::command(cmd));
            if fix.description != *cmd {
                eprintln!("      {}", Style::dim(&fix.description));
            }
        } else {
            eprintln!("{}: {}", Style::info("fix"), fix.description);
        }
    }

    /// Print a section header.
    pub fn header(&self, title: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!();
            eprintln!("{}", Style::bold(title));
        }
    }

    /// Print a list item.
    pub fn list_item(&self, key: &str, value: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("  {}: {}", Style::dim(key), value);
        }
    }

    /// Flush stdout and stderr.
    pub fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }
}
