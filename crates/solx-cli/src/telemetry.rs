//! Tracing setup for the solx CLI.

use solx_core::EnvVars;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

/// Initialize the tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from the
/// verbose flag.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("solx=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("solx=warn"))
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    // JSON output for machine consumption when requested
    if std::env::var(EnvVars::SOLX_LOG_JSON).is_ok() {
        let json_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_file(false)
            .without_time();

        subscriber.with(fmt_layer).init();
    }
}
