//! CLI styling for help output.

use clap::builder::{styling::AnsiColor, Styles};

/// Custom styles for the solx CLI.
pub const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().bold())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::Cyan.on_default().bold())
    .placeholder(AnsiColor::Cyan.on_default());
