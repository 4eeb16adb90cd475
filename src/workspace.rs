//! Run-scoped state for each module directory
//!
//! A [ModuleWorkspace] owns the open metadata handle for its module. All
//! workspaces live in the build for one run and are dropped together when the
//! run ends, which closes every handle on success and failure alike.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{ModuleBuilderError, Result};
use crate::metadata::MetadataFile;

/// One module directory taking part in a run
#[derive(Debug)]
pub struct ModuleWorkspace {
    /// Canonical absolute module directory
    pub dir: PathBuf,
    /// Last path component of `dir`; matched against detected changes
    pub base_name: String,
    pub has_changes: bool,
    pub metadata: MetadataFile,
}

impl ModuleWorkspace {
    /// Open the metadata file of the module at `dir`.
    ///
    /// The handle is writable only when the version may be rewritten.
    pub fn open(
        dir: &Path,
        metadata_file: &str,
        has_changes: bool,
        writable: bool,
    ) -> Result<Self> {
        let base_name = base_name(dir)?;
        let metadata = MetadataFile::open(dir.join(metadata_file), writable)?;

        Ok(ModuleWorkspace {
            dir: dir.to_path_buf(),
            base_name,
            has_changes,
            metadata,
        })
    }
}

/// Resolve module directory arguments to canonical absolute paths
pub fn resolve_dirs(dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::with_capacity(dirs.len());
    let mut errors = Vec::new();

    for dir in dirs {
        match dir.canonicalize() {
            Ok(abs) if abs.is_dir() => resolved.push(abs),
            Ok(abs) => errors.push(ModuleBuilderError::config(format!(
                "Module path {} is not a directory",
                abs.display()
            ))),
            Err(e) => errors.push(ModuleBuilderError::file(dir, e)),
        }
    }

    match ModuleBuilderError::phase("module path resolution", errors) {
        Some(err) => Err(err),
        None => Ok(resolved),
    }
}

/// Reject runs naming the same module directory twice
pub fn ensure_unique(dirs: &[PathBuf]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for dir in dirs {
        if !seen.insert(dir) {
            return Err(ModuleBuilderError::config(format!(
                "Module {} is given more than once",
                dir.display()
            )));
        }
    }
    Ok(())
}

pub fn base_name(dir: &Path) -> Result<String> {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ModuleBuilderError::config(format!("Module path {} has no base name", dir.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_open_workspace() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("foo");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("metadata.yaml"), "name: foo\nversion: 1.0.0\n").unwrap();

        let ws = ModuleWorkspace::open(&dir, "metadata.yaml", true, true).unwrap();
        assert_eq!(ws.base_name, "foo");
        assert!(ws.has_changes);
        assert_eq!(ws.metadata.path(), dir.join("metadata.yaml"));
    }

    #[test]
    fn test_resolve_dirs_collects_every_failure() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = resolve_dirs(&[root.path().join("missing"), file]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing"), "got: {}", msg);
        assert!(msg.contains("not a directory"), "got: {}", msg);
    }

    #[test]
    fn test_resolve_dirs_is_absolute() {
        let root = tempfile::tempdir().unwrap();
        let resolved = resolve_dirs(&[root.path().to_path_buf()]).unwrap();
        assert!(resolved[0].is_absolute());
    }

    #[test]
    fn test_ensure_unique() {
        let a = PathBuf::from("/repo/foo");
        let b = PathBuf::from("/repo/bar");
        assert!(ensure_unique(&[a.clone(), b]).is_ok());
        assert!(ensure_unique(&[a.clone(), a]).unwrap_err().is_config());
    }
}
