//! Build workflow orchestration
//!
//! Ties change detection, version bumps, archiving and index reconciliation
//! into one run. Kept apart from `main.rs` so the workflow can be driven
//! programmatically, with any [ChangeDetector] and [Archiver].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::archive::{Archiver, TarGzArchiver};
use crate::bumper::bump_module;
use crate::config::Config;
use crate::domain::version;
use crate::domain::{IndexChannel, ModuleRecord, NameVersion, PromotionDirective};
use crate::error::{ModuleBuilderError, Result};
use crate::events::BuildEvent;
use crate::git::{ChangeDetector, GitCli};
use crate::index::{reconcile, sort_index, ReconcileOutcome};
use crate::report::Reporter;
use crate::workspace::{ensure_unique, resolve_dirs, ModuleWorkspace};

/// Arguments for one build run
///
/// Mirrors the `module` subcommand but does not depend on clap.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    /// Module directories, relative or absolute
    pub dirs: Vec<PathBuf>,

    /// Where archives are written
    pub output_dir: PathBuf,

    /// Directory holding the index files
    pub index_dir: PathBuf,

    pub promotion: PromotionDirective,
}

impl BuildRequest {
    /// Request with the configured output dir and indexes in `index_dir`
    pub fn new(dirs: Vec<PathBuf>, config: &Config, index_dir: impl Into<PathBuf>) -> Self {
        BuildRequest {
            dirs,
            output_dir: config.output_dir.clone(),
            index_dir: index_dir.into(),
            promotion: PromotionDirective::None,
        }
    }

    pub fn with_promotion(mut self, promotion: PromotionDirective) -> Self {
        self.promotion = promotion;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

/// Result of a successful build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOutcome {
    /// One record per module, in argument order
    pub modules: Vec<ModuleRecord>,

    /// `None` when there was nothing to build
    pub development: Option<ReconcileOutcome>,
    pub release: Option<ReconcileOutcome>,
}

/// Main build workflow, using `git` and gzip'd tar archives
///
/// # Arguments
///
/// * `request` - Module dirs, output dir, index dir and promotion directive
/// * `config` - Loaded configuration
/// * `reporter` - Receives every build event
///
/// # Returns
///
/// The indexed records and what happened to each index
pub fn build_release(
    request: &BuildRequest,
    config: &Config,
    reporter: &dyn Reporter,
) -> Result<BuildOutcome> {
    let detector = GitCli::new(config.git.program.clone());
    let archiver = TarGzArchiver::new(&request.output_dir);

    build_release_with(request, config, &detector, &archiver, reporter)
}

/// Build workflow with injected collaborators
///
/// Orchestrates the whole run:
/// 1. Resolve module directories and reject duplicates
/// 2. Detect changed modules; promotion of a dirty tree is refused here,
///    before anything is written
/// 3. Open every module's metadata file
/// 4. Bump versions
/// 5. Archive each module
/// 6. Reconcile the development index, then the release index
///
/// Steps 3 to 6 run over every module before failing, so one error reports
/// all offending modules of that phase.
pub fn build_release_with(
    request: &BuildRequest,
    config: &Config,
    detector: &dyn ChangeDetector,
    archiver: &dyn Archiver,
    reporter: &dyn Reporter,
) -> Result<BuildOutcome> {
    if request.dirs.is_empty() {
        return Ok(BuildOutcome::default());
    }

    let dirs = resolve_dirs(&request.dirs)?;
    ensure_unique(&dirs)?;

    let changed = detector.changed_modules(&dirs)?;
    if request.promotion.is_promotion() && !changed.is_empty() {
        return Err(ModuleBuilderError::config(format!(
            "Cannot promote ({}) with uncommitted changes in: {}",
            request.promotion,
            changed.iter().cloned().collect::<Vec<_>>().join(", ")
        )));
    }

    let mut workspaces = open_workspaces(&dirs, &changed, config, request.promotion, reporter)?;

    let mut phase = Phase::new("modules versions bump", reporter);
    let mut declared = Vec::with_capacity(workspaces.len());
    for ws in workspaces.iter_mut() {
        let result = bump_module(ws, request.promotion, reporter);
        if let Some(nv) = phase.record(&ws.base_name, result) {
            declared.push((ws.dir.clone(), nv));
        }
    }
    phase.finish()?;

    let modules = archive_modules(&declared, archiver, reporter)?;

    let (development, release) =
        update_indexes(config, &request.index_dir, &modules, request.promotion, reporter)?;

    // Handles stay open until the whole run is done
    drop(workspaces);

    Ok(BuildOutcome {
        modules,
        development: Some(development),
        release: Some(release),
    })
}

/// Sort both index files under `index_dir`
///
/// Returns how many files were rewritten.
pub fn run_sort(config: &Config, index_dir: &Path, reporter: &dyn Reporter) -> Result<usize> {
    let mut phase = Phase::new("index sort", reporter);
    let mut rewritten = 0;

    for channel in [IndexChannel::Release, IndexChannel::Development] {
        let target = config.index.target(channel, index_dir);
        let result = sort_index(&target.path, reporter);
        if let Some(true) = phase.record(&channel.to_string(), result) {
            rewritten += 1;
        }
    }

    phase.finish()?;
    Ok(rewritten)
}

fn open_workspaces(
    dirs: &[PathBuf],
    changed: &BTreeSet<String>,
    config: &Config,
    promotion: PromotionDirective,
    reporter: &dyn Reporter,
) -> Result<Vec<ModuleWorkspace>> {
    let mut phase = Phase::new("metadata open", reporter);
    let mut workspaces = Vec::with_capacity(dirs.len());

    for dir in dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let has_changes = changed.contains(&name);
        let writable = has_changes || promotion.is_promotion();

        let result = ModuleWorkspace::open(dir, &config.metadata_file, has_changes, writable);
        if let Some(ws) = phase.record(&name, result) {
            workspaces.push(ws);
        }
    }

    phase.finish()?;
    Ok(workspaces)
}

fn archive_modules(
    declared: &[(PathBuf, NameVersion)],
    archiver: &dyn Archiver,
    reporter: &dyn Reporter,
) -> Result<Vec<ModuleRecord>> {
    let mut phase = Phase::new("archives baking", reporter);
    let mut records = Vec::with_capacity(declared.len());

    for (dir, module) in declared {
        if let Some(output) = phase.record(&module.name, archiver.archive(module, dir)) {
            reporter.report(BuildEvent::ArchiveWritten {
                module: module.key(),
                path: output.path,
                sha256sum: output.sha256sum.clone(),
            });
            records.push(ModuleRecord::from_declared(module.clone(), output.sha256sum));
        }
    }

    phase.finish()?;
    Ok(records)
}

fn update_indexes(
    config: &Config,
    index_dir: &Path,
    records: &[ModuleRecord],
    promotion: PromotionDirective,
    reporter: &dyn Reporter,
) -> Result<(ReconcileOutcome, ReconcileOutcome)> {
    let released: Vec<ModuleRecord> = records
        .iter()
        .filter(|r| {
            version::parse(&r.version)
                .map(|v| v.pre.is_empty())
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    let mut phase = Phase::new("index update", reporter);

    let dev_target = config.index.target(IndexChannel::Development, index_dir);
    let development = phase.record(
        &dev_target.path.display().to_string(),
        reconcile(&dev_target, records, promotion, reporter),
    );

    let release_target = config.index.target(IndexChannel::Release, index_dir);
    let release = phase.record(
        &release_target.path.display().to_string(),
        reconcile(&release_target, &released, promotion, reporter),
    );

    phase.finish()?;
    Ok((
        development.unwrap_or(ReconcileOutcome::Unchanged),
        release.unwrap_or(ReconcileOutcome::Unchanged),
    ))
}

/// Failures collected while one phase runs over every module
struct Phase<'a> {
    name: &'static str,
    errors: Vec<ModuleBuilderError>,
    reporter: &'a dyn Reporter,
}

impl<'a> Phase<'a> {
    fn new(name: &'static str, reporter: &'a dyn Reporter) -> Self {
        Phase {
            name,
            errors: Vec::new(),
            reporter,
        }
    }

    fn record<T>(&mut self, module: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.reporter.report(BuildEvent::ModuleFailed {
                    module: module.to_string(),
                    phase: self.name.to_string(),
                    reason: err.to_string(),
                });
                self.errors.push(err);
                None
            }
        }
    }

    fn finish(self) -> Result<()> {
        match ModuleBuilderError::phase(self.name, self.errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;

    #[test]
    fn test_empty_request_is_noop() {
        let config = Config::default();
        let request = BuildRequest::new(Vec::new(), &config, "/nonexistent");
        let outcome = build_release(&request, &config, &MemoryReporter::new()).unwrap();
        assert_eq!(outcome, BuildOutcome::default());
    }

    #[test]
    fn test_request_builders() {
        let config = Config::default();
        let request = BuildRequest::new(vec![PathBuf::from("foo")], &config, ".")
            .with_promotion(PromotionDirective::Major)
            .with_output_dir("out");

        assert_eq!(request.output_dir, PathBuf::from("out"));
        assert_eq!(request.promotion, PromotionDirective::Major);
        assert_eq!(request.index_dir, PathBuf::from("."));
    }

    #[test]
    fn test_phase_collects_failures() {
        let reporter = MemoryReporter::new();
        let mut phase = Phase::new("archives baking", &reporter);

        assert_eq!(phase.record("foo", Ok(1)), Some(1));
        assert_eq!(
            phase.record::<i32>("bar", Err(ModuleBuilderError::archive("boom"))),
            None
        );
        assert_eq!(
            phase.record::<i32>("baz", Err(ModuleBuilderError::archive("bang"))),
            None
        );

        let msg = phase.finish().unwrap_err().to_string();
        assert!(msg.starts_with("archives baking failed"), "got: {}", msg);
        assert!(msg.contains("boom") && msg.contains("bang"), "got: {}", msg);
        assert_eq!(
            reporter.events().iter().filter(|e| e.is_warning()).count(),
            2
        );
    }

    #[test]
    fn test_run_sort_without_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let rewritten = run_sort(&Config::default(), dir.path(), &MemoryReporter::new()).unwrap();
        assert_eq!(rewritten, 0);
    }
}
