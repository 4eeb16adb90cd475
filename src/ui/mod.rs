//! User-facing terminal output.
//!
//! Engine events go through `tracing`; this module only prints the status
//! lines and summaries the binary shows on stdout and stderr.

pub mod formatter;

pub use formatter::{display_build_summary, display_error, display_status, display_success};
