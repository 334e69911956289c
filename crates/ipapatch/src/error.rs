//! Error types for ipapatch operations.
//!
//! This module defines the [`enum@Error`] enum covering every failure in the
//! patch pipeline. Errors fall into two groups:
//!
//! - **Recoverable**: [`Error::ManifestParse`], [`Error::ManifestWrite`],
//!   [`Error::DirectoryList`] and [`Error::DirectoryRename`]. These are
//!   reported by the package processor and never halt a batch.
//! - **Fatal**: everything raised by the archive codec or by the pipeline's
//!   own rename and cleanup steps, wrapped in [`Error::Stage`].
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for ipapatch operations.
///
/// # Examples
///
/// ```no_run
/// use ipapatch::{BatchPipeline, Error, LogReporter, PatchConfig};
///
/// let config = PatchConfig::default();
/// let reporter = LogReporter;
/// match BatchPipeline::new(&config, &reporter).run(".") {
///     Ok(count) => println!("Patched {count} archives"),
///     Err(Error::Stage { stage, archive, source }) => {
///         eprintln!("{} failed while {stage}: {source}", archive.display())
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive operation failed.
    ///
    /// Occurs while reading or writing archive entries. See [`crate::archive`].
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The input is not a readable ZIP archive.
    #[error("Corrupt archive {}: {reason}", .path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    /// `manifest.json` is not valid JSON.
    ///
    /// The file on disk is left untouched.
    #[error("Failed to unmarshal {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The rewritten manifest could not be written back.
    #[error("Failed to write modified {}: {source}", .path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The module cache directory could not be listed.
    #[error("Failed to read module cache directory {}: {source}", .path.display())]
    DirectoryList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A matching module cache entry could not be renamed.
    #[error("Failed to rename {} to {}: {source}", .from.display(), .to.display())]
    DirectoryRename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pipeline stage failed; the batch halts.
    ///
    /// The archive is left in whatever state the failed stage reached.
    #[error("{} failed while {stage}: {source}", .archive.display())]
    Stage {
        stage: Stage,
        archive: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether the pipeline may continue after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ManifestParse { .. }
                | Error::ManifestWrite { .. }
                | Error::DirectoryList { .. }
                | Error::DirectoryRename { .. }
        )
    }
}
