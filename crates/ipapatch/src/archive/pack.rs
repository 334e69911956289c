//! Archive creation.
//!
//! Packs the contents of a directory into a ZIP/IPA archive. Entry names are
//! relative to the source directory, so unpacking and repacking a tree
//! yields the same entry set.
//!
//! For the reverse operation, see the [`extract`](super::extract) module.
//!
//! # Examples
//!
//! ```no_run
//! use ipapatch::archive::{pack, CompressionLevel};
//!
//! pack("Unpacked", "Unpacked.zip", CompressionLevel::DEFAULT)?;
//! # Ok::<(), ipapatch::Error>(())
//! ```

use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// ZIP compression level for repacked archives.
///
/// # Examples
///
/// ```
/// use ipapatch::archive::CompressionLevel;
///
/// let custom = CompressionLevel::new(3);
/// assert_eq!(custom.level(), 3);
/// assert_eq!(CompressionLevel::new(12).level(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// No compression (level 0), entries are stored.
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Default compression (level 6).
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Maximum compression (level 9).
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level from 0-9.
    ///
    /// Values greater than 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    /// Returns the compression level value (0-9).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }

    fn file_options(self) -> SimpleFileOptions {
        if self.0 == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.0 as i64))
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Pack every entry below `source_dir` into a new archive at `output_path`.
///
/// Directories become `name/` entries, symlinks are stored as symlinks and
/// regular files keep their Unix permissions. The source directory itself is
/// not an entry. Entries are written in file-name order. An existing file at
/// `output_path` is replaced.
///
/// # Errors
///
/// Returns [`Error::Io`] if `source_dir` is missing or not a directory, or if
/// a file cannot be read, and [`Error::Zip`] if the archive cannot be written.
pub fn pack(
    source_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    compression_level: CompressionLevel,
) -> Result<()> {
    let source_dir = source_dir.as_ref();
    let output_path = output_path.as_ref();

    if !source_dir.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Directory not found: {}", source_dir.display()),
        )));
    }

    if !source_dir.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Not a directory: {}", source_dir.display()),
        )));
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = compression_level.file_options();

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|e| Error::Io(io::Error::other(format!("Failed to walk directory: {e}"))))?;

        let path = entry.path();
        let relative_path = path.strip_prefix(source_dir).map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Failed to compute relative path",
            ))
        })?;

        // ZIP entry names always use forward slashes
        let archive_path = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let metadata = fs::symlink_metadata(path)?;

        if metadata.is_dir() {
            zip.add_directory(format!("{archive_path}/"), options)?;
        } else if metadata.file_type().is_symlink() {
            let target = fs::read_link(path)?;
            zip.add_symlink(archive_path.as_str(), target.to_string_lossy(), options)?;
        } else {
            #[cfg(unix)]
            let options = {
                use std::os::unix::fs::PermissionsExt;
                options.unix_permissions(metadata.permissions().mode())
            };

            zip.start_file(archive_path.as_str(), options)?;
            let buffer = fs::read(path)?;
            zip.write_all(&buffer)?;
        }
    }

    zip.finish()?;

    Ok(())
}
