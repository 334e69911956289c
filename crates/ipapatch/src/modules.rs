//! Module cache directory patching.
//!
//! The pnpm module cache holds one directory per installed dependency
//! version, e.g. `@react-navigation+elements@1.3.21`. Every such entry for
//! the target dependency is moved to the canonical patched name so the
//! rewritten manifest keys resolve.

use crate::report::Reporter;
use crate::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

/// What [`patch_directory`] did.
#[derive(Debug)]
pub enum DirectoryOutcome {
    /// No module cache directory; nothing to do.
    Missing,
    /// All matching entries were attempted.
    Patched {
        /// Entries moved to the patched name.
        renamed: usize,
        /// Per-entry failures, already reported.
        failures: Vec<Error>,
    },
}

impl DirectoryOutcome {
    pub fn renamed(&self) -> usize {
        match self {
            DirectoryOutcome::Missing => 0,
            DirectoryOutcome::Patched { renamed, .. } => *renamed,
        }
    }
}

/// Rename every immediate entry of `module_cache_dir` whose name contains
/// `target_token` to `patched_name`.
///
/// Entries are handled in listing order. An entry already called
/// `patched_name` is left alone. Once one entry has taken `patched_name`,
/// later matches fail with [`Error::DirectoryRename`] and stay where they
/// are; failures are reported and collected, and the scan continues.
///
/// # Errors
///
/// Returns [`Error::DirectoryList`] if the directory cannot be listed.
pub fn patch_directory(
    module_cache_dir: impl AsRef<Path>,
    target_token: &str,
    patched_name: &str,
    reporter: &dyn Reporter,
) -> Result<DirectoryOutcome> {
    let module_cache_dir = module_cache_dir.as_ref();

    if !module_cache_dir.exists() {
        reporter.debug("Node modules directory does not exist, no need to rename.");
        return Ok(DirectoryOutcome::Missing);
    }

    let list_error = |source| Error::DirectoryList {
        path: module_cache_dir.to_path_buf(),
        source,
    };

    // Names stay as OsString so non-UTF-8 entries can still be moved
    let mut matches: Vec<OsString> = Vec::new();
    for entry in fs::read_dir(module_cache_dir).map_err(list_error)? {
        let name = entry.map_err(list_error)?.file_name();
        if name.to_string_lossy().contains(target_token) {
            matches.push(name);
        }
    }

    let destination = module_cache_dir.join(patched_name);
    let mut renamed = 0;
    let mut failures = Vec::new();

    for name in &matches {
        let display = name.to_string_lossy();
        if name.as_os_str() == OsStr::new(patched_name) {
            reporter.debug(&format!("{display} is already patched"));
            continue;
        }

        let source = module_cache_dir.join(name);
        match move_entry(&source, &destination) {
            Ok(()) => {
                reporter.info(&format!("Renamed {target_token} directory: {display}"));
                renamed += 1;
            }
            Err(e) => {
                let error = Error::DirectoryRename {
                    from: source,
                    to: destination.clone(),
                    source: e,
                };
                reporter.error(&error.to_string());
                failures.push(error);
            }
        }
    }

    reporter.info(&format!("Successfully renamed {target_token} directories."));

    Ok(DirectoryOutcome::Patched { renamed, failures })
}

/// `rename(2)` that refuses to replace an existing destination.
fn move_entry(source: &Path, destination: &Path) -> io::Result<()> {
    if destination.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        ));
    }
    fs::rename(source, destination)
}
