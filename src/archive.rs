//! Reproducible module archives
//!
//! [TarGzArchiver] packs a module directory into `<name>-<version>.tgz` so
//! that the same tree always yields the same bytes: entries in file-name
//! order, fixed modes, zero timestamps and a fixed `root` owner. The SHA-256
//! of the compressed stream is computed while writing.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::domain::NameVersion;
use crate::error::{ModuleBuilderError, Result};

/// File extension of module archives.
pub const ARCHIVE_EXTENSION: &str = "tgz";

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o600;

/// A written archive and its content hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutput {
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the archive bytes
    pub sha256sum: String,
}

/// Packs a module directory into an archive
pub trait Archiver: Send + Sync {
    fn archive(&self, module: &NameVersion, dir: &Path) -> Result<ArchiveOutput>;
}

/// gzip'd tar archives written into one output directory
#[derive(Debug, Clone)]
pub struct TarGzArchiver {
    output_dir: PathBuf,
}

impl TarGzArchiver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        TarGzArchiver {
            output_dir: output_dir.into(),
        }
    }

    /// Final location of a module's archive
    pub fn archive_path(&self, module: &NameVersion) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", module.key(), ARCHIVE_EXTENSION))
    }
}

impl Archiver for TarGzArchiver {
    fn archive(&self, module: &NameVersion, dir: &Path) -> Result<ArchiveOutput> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| ModuleBuilderError::file(&self.output_dir, e))?;

        let target = self.archive_path(module);

        // Stage next to the target so the final rename stays on one filesystem.
        let staged = tempfile::Builder::new()
            .prefix(&format!("{}-", module.key()))
            .tempfile_in(&self.output_dir)
            .map_err(|e| ModuleBuilderError::file(&self.output_dir, e))?;

        let writer = HashingWriter::new(staged.as_file());
        let writer = write_tar_gz(dir, writer).map_err(|e| {
            ModuleBuilderError::archive(format!(
                "Failed to build the archive {} from {}: {}",
                target.display(),
                dir.display(),
                e
            ))
        })?;
        let sha256sum = writer.finalize_hex();

        staged
            .persist(&target)
            .map_err(|e| ModuleBuilderError::file(&target, e.error))?;

        Ok(ArchiveOutput {
            path: target,
            sha256sum,
        })
    }
}

fn write_tar_gz<W: Write>(root: &Path, writer: W) -> io::Result<W> {
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let rel = archive_name(root, entry.path())?;
        let file_type = entry.file_type();

        let mut header = tar::Header::new_gnu();
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_username("root")?;
        header.set_groupname("root")?;

        if file_type.is_dir() {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(DIR_MODE);
            header.set_size(0);
            builder.append_data(&mut header, format!("{}/", rel), io::empty())?;
        } else if file_type.is_file() {
            let file = File::open(entry.path())?;
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(FILE_MODE);
            header.set_size(file.metadata()?.len());
            builder.append_data(&mut header, &rel, file)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_mode(FILE_MODE);
            header.set_size(0);
            builder.append_link(&mut header, &rel, link)?;
        }
    }

    let encoder = builder.into_inner()?;
    encoder.finish()
}

/// Path inside the archive: relative to the module root, `/`-separated
fn archive_name(root: &Path, path: &Path) -> io::Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is outside {}", path.display(), root.display()),
        )
    })?;

    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    Ok(parts.join("/"))
}

/// Writer computing the SHA-256 of everything passed through it
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        HashingWriter {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finalize_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
