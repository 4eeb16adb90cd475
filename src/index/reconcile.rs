//! Merge a run's module records into one channel's index
//!
//! The same routine serves the development and the release index; the
//! channel only decides the file, the header of fresh documents and the
//! labels on reported events.

use std::collections::HashMap;

use semver::Version;

use crate::domain::version::{self, cmp_precedence};
use crate::domain::{IndexChannel, IndexDocument, IndexTarget, ModuleRecord, PromotionDirective};
use crate::error::{ModuleBuilderError, Result};
use crate::events::BuildEvent;
use crate::index::IndexFile;
use crate::report::Reporter;

/// What reconciliation did to the index file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No usable index existed; a fresh one was written
    Created { modules: usize },
    /// The merged document was rewritten
    Updated { modules: usize },
    /// Nothing to change, the file was not written
    Unchanged,
}

impl ReconcileOutcome {
    pub fn wrote(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged)
    }
}

/// Merge `new_records` into the index at `target`.
///
/// Existing keys get their hash corrected when it differs, unknown keys are
/// appended, then development records are pruned according to `directive`.
/// The file is only rewritten when the record list actually changed, so
/// repeating a call with the same input is a no-op.
pub fn reconcile(
    target: &IndexTarget,
    new_records: &[ModuleRecord],
    directive: PromotionDirective,
    reporter: &dyn Reporter,
) -> Result<ReconcileOutcome> {
    if new_records.is_empty() && !target.path.exists() {
        return Ok(ReconcileOutcome::Unchanged);
    }

    let mut file = IndexFile::open(&target.path)?;

    let mut document = match file.load()? {
        Some(document) => document,
        None if new_records.is_empty() => {
            reporter.report(BuildEvent::IndexUnchanged {
                channel: target.channel,
                path: target.path.clone(),
            });
            return Ok(ReconcileOutcome::Unchanged);
        }
        None => {
            let document = IndexDocument::fresh(target, dedup(new_records));
            file.store(&document)?;

            let modules = document.modules().len();
            reporter.report(BuildEvent::IndexCreated {
                channel: target.channel,
                path: target.path.clone(),
                modules,
            });
            return Ok(ReconcileOutcome::Created { modules });
        }
    };

    let before = document.spec.modules.clone();
    let modules = &mut document.spec.modules;

    merge(modules, new_records, target.channel, reporter);
    prune(modules, new_records, directive, target.channel, reporter).map_err(|e| {
        ModuleBuilderError::index(format!("{}: {}", target.path.display(), e))
    })?;

    if *modules == before {
        reporter.report(BuildEvent::IndexUnchanged {
            channel: target.channel,
            path: target.path.clone(),
        });
        return Ok(ReconcileOutcome::Unchanged);
    }

    file.store(&document)?;

    let modules = document.modules().len();
    reporter.report(BuildEvent::IndexWritten {
        channel: target.channel,
        path: target.path.clone(),
        modules,
    });
    Ok(ReconcileOutcome::Updated { modules })
}

/// Insert new keys, correct hashes of known ones
fn merge(
    modules: &mut Vec<ModuleRecord>,
    new_records: &[ModuleRecord],
    channel: IndexChannel,
    reporter: &dyn Reporter,
) {
    let mut slots: HashMap<String, usize> = modules
        .iter()
        .enumerate()
        .map(|(i, m)| (m.key(), i))
        .collect();

    for record in new_records {
        let key = record.key();

        match slots.get(&key) {
            Some(&idx) if modules[idx].sha256sum == record.sha256sum => {
                reporter.report(BuildEvent::RecordUpToDate {
                    channel,
                    module: key,
                });
            }
            Some(&idx) => {
                reporter.report(BuildEvent::HashReplaced {
                    channel,
                    module: key,
                    old: modules[idx].sha256sum.clone(),
                    new: record.sha256sum.clone(),
                });
                modules[idx].sha256sum = record.sha256sum.clone();
            }
            None => {
                reporter.report(BuildEvent::RecordAppended {
                    channel,
                    module: key.clone(),
                    sha256sum: record.sha256sum.clone(),
                });
                slots.insert(key, modules.len());
                modules.push(record.clone());
            }
        }
    }
}

/// Drop development records retired by this run.
///
/// Promotion retires every `-dev` record of a promoted module. A development
/// iteration retires only `-dev` records strictly older than the new version.
fn prune(
    modules: &mut Vec<ModuleRecord>,
    new_records: &[ModuleRecord],
    directive: PromotionDirective,
    channel: IndexChannel,
    reporter: &dyn Reporter,
) -> Result<()> {
    let incoming: Vec<(&str, Version)> = new_records
        .iter()
        .map(|r| -> Result<(&str, Version)> { Ok((r.name.as_str(), version::parse(&r.version)?)) })
        .collect::<Result<_>>()?;

    let mut keep = Vec::with_capacity(modules.len());
    for existing in modules.iter() {
        let related: Vec<&Version> = incoming
            .iter()
            .filter(|(name, _)| *name == existing.name)
            .map(|(_, v)| v)
            .collect();

        if related.is_empty() {
            keep.push(true);
            continue;
        }

        let existing_version = version::parse(&existing.version)?;
        if !version::is_development(&existing_version) {
            keep.push(true);
            continue;
        }

        let retired = if directive.is_promotion() {
            true
        } else {
            related
                .iter()
                .any(|new| cmp_precedence(&existing_version, new).is_lt())
        };
        keep.push(!retired);
    }

    let mut flags = keep.into_iter();
    modules.retain(|m| {
        let kept = flags.next().unwrap_or(true);
        if !kept {
            reporter.report(BuildEvent::RecordPruned {
                channel,
                module: m.key(),
            });
        }
        kept
    });

    Ok(())
}

/// First occurrence of each key, in order
fn dedup(records: &[ModuleRecord]) -> Vec<ModuleRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.key()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::read_index;
    use crate::report::MemoryReporter;
    use std::path::Path;

    fn target(dir: &Path) -> IndexTarget {
        IndexTarget {
            channel: IndexChannel::Development,
            path: dir.join("index-dev.yaml"),
            api_version: "kaas.mirantis.com/v1alpha1".to_string(),
            kind: "HostOSConfigurationModules".to_string(),
            name: "host-os-modules-dev".to_string(),
        }
    }

    fn seed(target: &IndexTarget, records: Vec<ModuleRecord>) {
        let mut file = IndexFile::open(&target.path).unwrap();
        file.store(&IndexDocument::fresh(target, records)).unwrap();
    }

    fn keys(target: &IndexTarget) -> Vec<String> {
        read_index(&target.path)
            .unwrap()
            .map(|d| d.modules().iter().map(|m| m.key()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_creates_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        let reporter = MemoryReporter::new();

        let outcome = reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.0-dev", "aa")],
            PromotionDirective::None,
            &reporter,
        )
        .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Created { modules: 1 });
        assert_eq!(keys(&t), vec!["foo-1.0.0-dev"]);
    }

    #[test]
    fn test_no_records_and_no_index_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());

        let outcome = reconcile(&t, &[], PromotionDirective::None, &MemoryReporter::new()).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
        assert!(!t.path.exists());
    }

    #[test]
    fn test_empty_index_without_records_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, Vec::new());
        let before = std::fs::read(&t.path).unwrap();

        for _ in 0..2 {
            let outcome =
                reconcile(&t, &[], PromotionDirective::None, &MemoryReporter::new()).unwrap();
            assert_eq!(outcome, ReconcileOutcome::Unchanged);
        }
        assert_eq!(before, std::fs::read(&t.path).unwrap());
    }

    #[test]
    fn test_empty_index_gets_created_with_records() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, Vec::new());

        let outcome = reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.0", "aa")],
            PromotionDirective::None,
            &MemoryReporter::new(),
        )
        .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Created { modules: 1 });
        assert_eq!(keys(&t), vec!["foo-1.0.0"]);
    }

    #[test]
    fn test_same_hash_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, vec![ModuleRecord::new("foo", "1.0.0", "aa")]);
        let reporter = MemoryReporter::new();

        let outcome = reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.0", "aa")],
            PromotionDirective::None,
            &reporter,
        )
        .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Unchanged);
        assert!(reporter.events().contains(&BuildEvent::RecordUpToDate {
            channel: IndexChannel::Development,
            module: "foo-1.0.0".to_string(),
        }));
    }

    #[test]
    fn test_hash_corrected_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(
            &t,
            vec![
                ModuleRecord::new("foo", "1.0.0", "aa"),
                ModuleRecord::new("bar", "1.0.0", "cc"),
            ],
        );
        let reporter = MemoryReporter::new();

        let outcome = reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.0", "bb")],
            PromotionDirective::None,
            &reporter,
        )
        .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated { modules: 2 });
        let doc = read_index(&t.path).unwrap().unwrap();
        assert_eq!(doc.modules()[0], ModuleRecord::new("foo", "1.0.0", "bb"));
        assert!(reporter.events().contains(&BuildEvent::HashReplaced {
            channel: IndexChannel::Development,
            module: "foo-1.0.0".to_string(),
            old: "aa".to_string(),
            new: "bb".to_string(),
        }));
    }

    #[test]
    fn test_older_dev_version_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, vec![ModuleRecord::new("foo", "1.0.0-dev", "aa")]);

        reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.1-dev", "bb")],
            PromotionDirective::None,
            &MemoryReporter::new(),
        )
        .unwrap();

        assert_eq!(keys(&t), vec!["foo-1.0.1-dev"]);
    }

    #[test]
    fn test_newer_dev_version_kept() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, vec![ModuleRecord::new("foo", "2.0.0-dev", "aa")]);

        reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.1-dev", "bb")],
            PromotionDirective::None,
            &MemoryReporter::new(),
        )
        .unwrap();

        assert_eq!(keys(&t), vec!["foo-2.0.0-dev", "foo-1.0.1-dev"]);
    }

    #[test]
    fn test_released_versions_never_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, vec![ModuleRecord::new("foo", "1.0.0", "aa")]);

        reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.1-dev", "bb")],
            PromotionDirective::None,
            &MemoryReporter::new(),
        )
        .unwrap();

        assert_eq!(keys(&t), vec!["foo-1.0.0", "foo-1.0.1-dev"]);
    }

    #[test]
    fn test_promotion_retires_dev_versions_of_promoted_modules() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(
            &t,
            vec![
                ModuleRecord::new("foo", "1.0.0-dev", "aa"),
                ModuleRecord::new("bar", "1.0.0-dev", "bb"),
            ],
        );
        let reporter = MemoryReporter::new();

        reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.1.0", "cc")],
            PromotionDirective::Minor,
            &reporter,
        )
        .unwrap();

        assert_eq!(keys(&t), vec!["bar-1.0.0-dev", "foo-1.1.0"]);
        assert!(reporter.events().contains(&BuildEvent::RecordPruned {
            channel: IndexChannel::Development,
            module: "foo-1.0.0-dev".to_string(),
        }));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(
            &t,
            vec![
                ModuleRecord::new("foo", "1.0.0-dev", "aa"),
                ModuleRecord::new("bar", "0.1.0", "bb"),
            ],
        );
        let records = [
            ModuleRecord::new("foo", "1.0.1-dev", "cc"),
            ModuleRecord::new("bar", "0.1.0", "bb"),
        ];

        let first = reconcile(&t, &records, PromotionDirective::None, &MemoryReporter::new()).unwrap();
        let after_first = std::fs::read(&t.path).unwrap();
        let second = reconcile(&t, &records, PromotionDirective::None, &MemoryReporter::new()).unwrap();

        assert!(first.wrote());
        assert_eq!(second, ReconcileOutcome::Unchanged);
        assert_eq!(after_first, std::fs::read(&t.path).unwrap());
    }

    #[test]
    fn test_duplicate_new_records_indexed_once() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, vec![ModuleRecord::new("bar", "1.0.0", "bb")]);

        let record = ModuleRecord::new("foo", "1.0.0", "aa");
        reconcile(
            &t,
            &[record.clone(), record],
            PromotionDirective::None,
            &MemoryReporter::new(),
        )
        .unwrap();

        assert_eq!(keys(&t), vec!["bar-1.0.0", "foo-1.0.0"]);
    }

    #[test]
    fn test_malformed_version_in_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(dir.path());
        seed(&t, vec![ModuleRecord::new("foo", "not-semver", "aa")]);

        let err = reconcile(
            &t,
            &[ModuleRecord::new("foo", "1.0.1-dev", "bb")],
            PromotionDirective::None,
            &MemoryReporter::new(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("index-dev.yaml"));
    }
}
