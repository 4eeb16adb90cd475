use std::fmt;
use std::path::PathBuf;

use crate::domain::IndexChannel;

/// Notable things that happen during a build.
/// None of these are errors; failures travel as `ModuleBuilderError`.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// Metadata version rewritten on disk
    VersionBumped {
        module: String,
        from: String,
        to: String,
        path: PathBuf,
    },
    /// Promotion requested but the module has no pre-release to promote
    AlreadyReleased { module: String, version: String },
    /// A module failed in one phase; the batch carries on
    ModuleFailed {
        module: String,
        phase: String,
        reason: String,
    },
    /// Archive written to the output directory
    ArchiveWritten {
        module: String,
        path: PathBuf,
        sha256sum: String,
    },
    /// No usable index on disk, a fresh one was written
    IndexCreated {
        channel: IndexChannel,
        path: PathBuf,
        modules: usize,
    },
    /// Same name, version and hash already indexed
    RecordUpToDate { channel: IndexChannel, module: String },
    /// Same name and version indexed with a different archive hash
    HashReplaced {
        channel: IndexChannel,
        module: String,
        old: String,
        new: String,
    },
    RecordAppended {
        channel: IndexChannel,
        module: String,
        sha256sum: String,
    },
    /// Superseded or promoted development record dropped
    RecordPruned { channel: IndexChannel, module: String },
    /// Reconciliation produced the document already on disk
    IndexUnchanged { channel: IndexChannel, path: PathBuf },
    IndexWritten {
        channel: IndexChannel,
        path: PathBuf,
        modules: usize,
    },
    IndexSorted { path: PathBuf, modules: usize },
}

impl BuildEvent {
    /// Events that deserve a warning rather than an informational line
    pub fn is_warning(&self) -> bool {
        matches!(self, BuildEvent::ModuleFailed { .. })
    }
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildEvent::VersionBumped {
                module,
                from,
                to,
                path,
            } => write!(
                f,
                "Bumped module {} version {} -> {} in {}",
                module,
                from,
                to,
                path.display()
            ),
            BuildEvent::AlreadyReleased { module, version } => write!(
                f,
                "Module {} is already released at {}, nothing to promote",
                module, version
            ),
            BuildEvent::ModuleFailed {
                module,
                phase,
                reason,
            } => write!(f, "Module {} failed during {}: {}", module, phase, reason),
            BuildEvent::ArchiveWritten {
                module,
                path,
                sha256sum,
            } => write!(
                f,
                "Archived module {} to {} (sha256: {})",
                module,
                path.display(),
                sha256sum
            ),
            BuildEvent::IndexCreated {
                channel,
                path,
                modules,
            } => write!(
                f,
                "Created {} index {} with {} module(s)",
                channel,
                path.display(),
                modules
            ),
            BuildEvent::RecordUpToDate { channel, module } => write!(
                f,
                "The {} index is up to date for module {}, nothing to do",
                channel, module
            ),
            BuildEvent::HashReplaced {
                channel,
                module,
                old,
                new,
            } => write!(
                f,
                "Replacing hashsum in the {} index for existing module {}: old sha256 {}, new sha256 {}",
                channel, module, old, new
            ),
            BuildEvent::RecordAppended {
                channel,
                module,
                sha256sum,
            } => write!(
                f,
                "Appending module {} to the {} index, sha256: {}",
                module, channel, sha256sum
            ),
            BuildEvent::RecordPruned { channel, module } => write!(
                f,
                "Pruned development version {} from the {} index",
                module, channel
            ),
            BuildEvent::IndexUnchanged { channel, path } => write!(
                f,
                "The {} index {} has actual data, nothing to do",
                channel,
                path.display()
            ),
            BuildEvent::IndexWritten {
                channel,
                path,
                modules,
            } => write!(
                f,
                "Wrote {} index {} with {} module(s)",
                channel,
                path.display(),
                modules
            ),
            BuildEvent::IndexSorted { path, modules } => {
                write!(f, "Sorted {} module(s) in {}", modules, path.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_replaced_reports_both_hashes() {
        let event = BuildEvent::HashReplaced {
            channel: IndexChannel::Development,
            module: "foo-1.0.0".to_string(),
            old: "aaaa".to_string(),
            new: "bbbb".to_string(),
        };

        let msg = event.to_string();
        assert!(msg.contains("old sha256 aaaa"), "got: {}", msg);
        assert!(msg.contains("new sha256 bbbb"), "got: {}", msg);
    }

    #[test]
    fn test_only_failures_are_warnings() {
        let failed = BuildEvent::ModuleFailed {
            module: "foo".to_string(),
            phase: "version bump".to_string(),
            reason: "bad".to_string(),
        };
        let pruned = BuildEvent::RecordPruned {
            channel: IndexChannel::Release,
            module: "foo-1.0.0-dev".to_string(),
        };

        assert!(failed.is_warning());
        assert!(!pruned.is_warning());
    }
}
