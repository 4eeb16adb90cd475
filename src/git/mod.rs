//! Change detection over module directories
//!
//! The [ChangeDetector] trait answers one question: which module directories
//! have content changes that are not committed yet. Implementations:
//!
//! - [cli::GitCli]: runs `git diff --name-only -z` and parses its output
//! - [mock::StaticChanges]: a fixed answer for tests
//!
//! The output parsing lives in [parse_module_names] and needs no process.

pub mod cli;
pub mod mock;

pub use cli::GitCli;
pub use mock::StaticChanges;

use crate::error::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Detects modules with uncommitted changes
pub trait ChangeDetector: Send + Sync {
    /// Return the base names of the directories in `dirs` that changed.
    ///
    /// # Arguments
    /// * `dirs` - Absolute module directory paths
    ///
    /// # Returns
    /// * `Ok(set)` - Base names of changed modules, empty when the tree is clean
    /// * `Err` - If the underlying diff could not be run or failed
    fn changed_modules(&self, dirs: &[PathBuf]) -> Result<BTreeSet<String>>;
}

/// Parse NUL-separated `git diff --name-only -z` output into module names.
///
/// Each fragment is a path relative to the directory holding the modules; its
/// leading segment is the module name, so nested changes collapse to one
/// entry. Empty fragments are skipped.
pub fn parse_module_names(output: &[u8]) -> BTreeSet<String> {
    output
        .split(|b| *b == 0)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| {
            let head = match fragment.iter().position(|b| *b == b'/') {
                Some(idx) => &fragment[..idx],
                None => fragment,
            };
            String::from_utf8_lossy(head).into_owned()
        })
        .filter(|name| !name.is_empty())
        .collect()
}
