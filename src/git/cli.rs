use crate::error::{ModuleBuilderError, Result};
use crate::git::{parse_module_names, ChangeDetector};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Flags making `git diff` report changed file names only, NUL-separated,
/// relative to the working directory, with exit code 1 when anything differs.
const DIFF_FLAGS: [&str; 5] = [
    "--exit-code",
    "-z",
    "--name-only",
    "--no-ext-diff",
    "--relative",
];

/// Change detection through the system `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    /// Use `program` as the git executable (normally just "git")
    pub fn new(program: impl Into<String>) -> Self {
        GitCli {
            program: program.into(),
        }
    }

    fn diff(&self, parent: &Path, names: &[OsString]) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(parent)
            .arg("diff")
            .args(DIFF_FLAGS)
            .arg("--")
            .args(names);

        let rendered = format!(
            "{} diff {} -- {}",
            self.program,
            DIFF_FLAGS.join(" "),
            names
                .iter()
                .map(|n| n.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = cmd.output().map_err(|e| {
            ModuleBuilderError::git(format!(
                "Failed to execute '{}' in {}: {}",
                rendered,
                parent.display(),
                e
            ))
        })?;

        match output.status.code() {
            Some(0) | Some(1) => Ok(output.stdout),
            code => Err(ModuleBuilderError::git(format!(
                "'{}' in {} failed with exit code {}: {}",
                rendered,
                parent.display(),
                code.map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string()),
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        GitCli::new("git")
    }
}

impl ChangeDetector for GitCli {
    fn changed_modules(&self, dirs: &[PathBuf]) -> Result<BTreeSet<String>> {
        // One diff per parent directory keeps every reported path rooted at a
        // module base name.
        let mut by_parent: BTreeMap<PathBuf, Vec<OsString>> = BTreeMap::new();
        for dir in dirs {
            let (parent, name) = match (dir.parent(), dir.file_name()) {
                (Some(parent), Some(name)) => (parent.to_path_buf(), name.to_os_string()),
                _ => {
                    return Err(ModuleBuilderError::config(format!(
                        "Module path {} has no parent directory",
                        dir.display()
                    )))
                }
            };
            by_parent.entry(parent).or_default().push(name);
        }

        let mut changed = BTreeSet::new();
        for (parent, names) in by_parent {
            let output = self.diff(&parent, &names)?;
            changed.extend(parse_module_names(&output));
        }

        Ok(changed)
    }
}
