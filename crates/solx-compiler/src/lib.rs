//! solc invocation and output handling.
//!
//! Wraps installed solc binaries: builds command lines, runs them, and
//! normalizes combined-JSON and standard-JSON output into the shapes
//! callers actually consume.

pub mod compile;
pub mod output;
pub mod wrapper;

pub use compile::{compile_files, compile_source, compile_standard, link_code, CompileOptions};
pub use output::{error_messages, normalize_combined, strip_link_marker, ALL_OUTPUT_VALUES};
pub use wrapper::{solc_version, SolcCommand, SolcOutput};
