//! Module metadata file (`metadata.yaml`) access
//!
//! The file is parsed as YAML to learn the module name and version, but it is
//! rewritten by line substitution only: the single `version:` line changes,
//! every other byte stays as the author wrote it.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::NameVersion;
use crate::error::{ModuleBuilderError, Result};

fn version_line() -> Option<&'static Regex> {
    static VERSION_LINE: OnceLock<Option<Regex>> = OnceLock::new();
    VERSION_LINE
        .get_or_init(|| {
            Regex::new(
                r#"^version:(?P<ws>[ \t]*)(?P<open>["']?)(?P<value>[^\s#"']*)(?P<close>["']?)(?P<rest>.*)$"#,
            )
            .ok()
        })
        .as_ref()
}

/// Open handle on one module's metadata file
#[derive(Debug)]
pub struct MetadataFile {
    path: PathBuf,
    file: File,
}

impl MetadataFile {
    /// Open the metadata file, for writing too when the version may change.
    ///
    /// The file must already exist.
    pub fn open(path: impl Into<PathBuf>, writable: bool) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&path)
            .map_err(|e| ModuleBuilderError::file(&path, e))?;

        Ok(MetadataFile { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&mut self) -> Result<String> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;

        let mut contents = String::new();
        self.file
            .read_to_string(&mut contents)
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;
        Ok(contents)
    }

    /// Decode the declared module name and version
    pub fn read_declaration(&mut self) -> Result<NameVersion> {
        let contents = self.read_all()?;
        serde_yaml::from_str(&contents).map_err(|e| {
            ModuleBuilderError::metadata(format!(
                "Failed to deserialize {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Rewrite the `version:` line in place, leaving all other lines untouched
    pub fn rewrite_version(&mut self, new_version: &str) -> Result<()> {
        let contents = self.read_all()?;
        let updated = replace_version_line(&contents, new_version).map_err(|e| {
            ModuleBuilderError::metadata(format!("{}: {}", self.path.display(), e))
        })?;

        self.file
            .set_len(0)
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;
        self.file
            .write_all(updated.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;

        Ok(())
    }
}

/// Replace the value on the single line starting with `version:`.
///
/// Quoting, trailing comments and line endings of that line are kept.
/// Fails unless exactly one such line exists.
pub fn replace_version_line(contents: &str, new_version: &str) -> Result<String> {
    let mut lines: Vec<String> = contents.split('\n').map(str::to_string).collect();

    let matching: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with("version:"))
        .map(|(i, _)| i)
        .collect();

    let idx = match matching.as_slice() {
        [idx] => *idx,
        [] => return Err(ModuleBuilderError::metadata("no line starts with 'version:'")),
        _ => {
            return Err(ModuleBuilderError::metadata(format!(
                "{} lines start with 'version:', expected exactly one",
                matching.len()
            )))
        }
    };

    let line = &lines[idx];
    let replaced = match version_line().and_then(|re| re.captures(line)) {
        Some(caps) => {
            let ws = match &caps["ws"] {
                "" => " ",
                ws => ws,
            };
            format!(
                "version:{}{}{}{}{}",
                ws,
                &caps["open"],
                new_version,
                &caps["close"],
                &caps["rest"]
            )
        }
        None => format!("version: {}", new_version),
    };
    lines[idx] = replaced;

    Ok(lines.join("\n"))
}
