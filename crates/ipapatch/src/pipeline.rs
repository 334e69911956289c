//! Batch patch pipeline.
//!
//! Finds every archive in a directory and takes each one through a full
//! cycle before moving on to the next:
//!
//! 1. Rename `App.ipa` to `App.zip`
//! 2. Unpack `App.zip` into `App/`
//! 3. Patch the package in `App/` (see [`crate::package`])
//! 4. Pack `App/` into `App.zip`, replacing the original archive
//! 5. Rename `App.zip` back to `App.ipa`
//! 6. Remove `App/`
//!
//! A failure in any of these steps other than 3 halts the whole batch and
//! leaves the current archive wherever it got to. Nothing is rolled back.

use crate::archive::{pack, unpack};
use crate::config::{PatchConfig, ZIP_EXTENSION};
use crate::package::{process_package, PackageReport};
use crate::report::Reporter;
use crate::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Lifecycle of one archive. Each variant names the state reached once the
/// corresponding step succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    Renamed,
    Unpacked,
    Processed,
    Repacked,
    Restored,
    CleanedUp,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Stage::Discovered => "discovering archives",
            Stage::Renamed => "renaming to .zip",
            Stage::Unpacked => "unpacking",
            Stage::Processed => "patching",
            Stage::Repacked => "repacking",
            Stage::Restored => "restoring the original name",
            Stage::CleanedUp => "removing the unpacked directory",
        };
        f.write_str(step)
    }
}

/// Runs the patch cycle over archives.
pub struct BatchPipeline<'a> {
    config: &'a PatchConfig,
    reporter: &'a dyn Reporter,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(config: &'a PatchConfig, reporter: &'a dyn Reporter) -> Self {
        Self { config, reporter }
    }

    /// List the archives directly inside `dir`.
    ///
    /// Only regular files whose name ends with `.<extension>` are picked up;
    /// the match is case-sensitive. Results are sorted by path.
    pub fn discover(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let suffix = format!(".{}", self.config.get_archive_extension());

        let mut archives = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(&suffix) {
                continue;
            }
            if entry.file_type()?.is_file() {
                archives.push(entry.path());
            }
        }

        archives.sort();
        Ok(archives)
    }

    /// Patch every archive in `dir`, one after another.
    ///
    /// Returns the number of archives processed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stage`] for the first archive whose cycle fails. The
    /// remaining archives are not touched.
    pub fn run(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        self.reporter.debug(&format!(
            "Starting the processing of .{} files...",
            self.config.get_archive_extension()
        ));

        let archives = self
            .discover(dir)
            .map_err(|e| stage_error(Stage::Discovered, dir, e))?;

        for archive in &archives {
            self.process_archive(archive)?;
        }

        Ok(archives.len())
    }

    /// Run the full cycle for one archive.
    ///
    /// On success the archive is back at `archive_path` and its unpacked
    /// directory is gone.
    pub fn process_archive(&self, archive_path: impl AsRef<Path>) -> Result<PackageReport> {
        let archive_path = archive_path.as_ref();
        let zip_path = archive_path.with_extension(ZIP_EXTENSION);
        let unpacked = archive_path.with_extension("");
        let fail = |stage: Stage| move |e: Error| stage_error(stage, archive_path, e);

        fs::rename(archive_path, &zip_path)
            .map_err(Error::from)
            .map_err(fail(Stage::Renamed))?;
        self.reporter.info(&format!(
            "Renamed {} to {}",
            archive_path.display(),
            zip_path.display()
        ));

        unpack(&zip_path, &unpacked).map_err(fail(Stage::Unpacked))?;
        self.reporter.info(&format!(
            "Extracted {} to {}",
            zip_path.display(),
            unpacked.display()
        ));

        let report = process_package(&unpacked, self.config, self.reporter);

        pack(&unpacked, &zip_path, self.config.get_compression_level())
            .map_err(fail(Stage::Repacked))?;
        self.reporter.info(&format!(
            "Re-zipped {} to {}",
            unpacked.display(),
            zip_path.display()
        ));

        fs::rename(&zip_path, archive_path)
            .map_err(Error::from)
            .map_err(fail(Stage::Restored))?;
        self.reporter.info(&format!(
            "Renamed {} back to {}",
            zip_path.display(),
            archive_path.display()
        ));

        fs::remove_dir_all(&unpacked)
            .map_err(Error::from)
            .map_err(fail(Stage::CleanedUp))?;
        self.reporter.info(&format!(
            "Cleaned up extracted directory {}",
            unpacked.display()
        ));

        Ok(report)
    }
}

fn stage_error(stage: Stage, archive: &Path, source: Error) -> Error {
    Error::Stage {
        stage,
        archive: archive.to_path_buf(),
        source: Box::new(source),
    }
}
