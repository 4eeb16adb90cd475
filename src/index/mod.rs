//! Persisted index documents
//!
//! [IndexFile] owns the open handle for the duration of one reconciliation or
//! sort. Reading treats a missing, blank or header-less document as "no index
//! yet"; writing truncates and rewrites the whole document.

pub mod reconcile;
pub mod sort;

pub use reconcile::{reconcile, ReconcileOutcome};
pub use sort::sort_index;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::domain::IndexDocument;
use crate::error::{ModuleBuilderError, Result};

/// Open index document file
#[derive(Debug)]
pub struct IndexFile {
    path: PathBuf,
    file: File,
}

impl IndexFile {
    /// Open for reading and writing, creating the file when missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ModuleBuilderError::file(&path, e))?;

        Ok(IndexFile { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the document, `None` when there is no usable index yet
    pub fn load(&mut self) -> Result<Option<IndexDocument>> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;

        let mut contents = String::new();
        self.file
            .read_to_string(&mut contents)
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;

        decode(&contents, &self.path)
    }

    /// Replace the file contents with `document`
    pub fn store(&mut self, document: &IndexDocument) -> Result<()> {
        let encoded = encode(document)?;

        self.file
            .set_len(0)
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;
        self.file
            .write_all(encoded.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| ModuleBuilderError::file(&self.path, e))?;

        Ok(())
    }
}

/// Read an index without creating it; `None` when missing or empty
pub fn read_index(path: &Path) -> Result<Option<IndexDocument>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => decode(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ModuleBuilderError::file(path, e)),
    }
}

fn decode(contents: &str, path: &Path) -> Result<Option<IndexDocument>> {
    if contents.trim().is_empty() {
        return Ok(None);
    }

    let document: IndexDocument = serde_yaml::from_str(contents).map_err(|e| {
        ModuleBuilderError::index(format!("Failed to deserialize {}: {}", path.display(), e))
    })?;

    if document.is_empty() {
        return Ok(None);
    }

    Ok(Some(document))
}

/// Serialize a document as YAML with two-space indentation
///
/// Block sequences are nested two spaces under their key (`modules:` then
/// `  - name: ...`), matching the layout of hand-maintained indexes.
pub fn encode(document: &IndexDocument) -> Result<String> {
    let yaml = serde_yaml::to_string(document)?;
    Ok(indent_sequences(&yaml))
}

/// Shift block sequences written flush with their parent key two spaces right
fn indent_sequences(yaml: &str) -> String {
    let lines: Vec<&str> = yaml.lines().collect();
    // Key columns of the flush sequences enclosing the current line
    let mut open: Vec<usize> = Vec::new();
    let mut out = String::with_capacity(yaml.len() + yaml.len() / 4);

    for (i, line) in lines.iter().enumerate() {
        let content = line.trim_start_matches(' ');
        let indent = line.len() - content.len();

        if !content.is_empty() {
            while let Some(&column) = open.last() {
                let inside = indent > column || (indent == column && is_item(content));
                if inside {
                    break;
                }
                open.pop();
            }
        }

        if !content.is_empty() {
            out.push_str(&" ".repeat(indent + 2 * open.len()));
        }
        out.push_str(content);
        out.push('\n');

        if let Some(column) = key_column(indent, content) {
            let starts_flush_sequence = lines.get(i + 1).map_or(false, |next| {
                let next_content = next.trim_start_matches(' ');
                next.len() - next_content.len() == column && is_item(next_content)
            });
            if starts_flush_sequence {
                open.push(column);
            }
        }
    }

    out
}

fn is_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Column of a mapping key whose value starts on the next line
fn key_column(indent: usize, content: &str) -> Option<usize> {
    let mut column = indent;
    let mut rest = content;
    while let Some(stripped) = rest.strip_prefix("- ") {
        column += 2;
        rest = stripped;
    }

    let opens_block = rest.ends_with(':') && !rest.starts_with('#') && !rest.starts_with('-');
    opens_block.then_some(column)
}
