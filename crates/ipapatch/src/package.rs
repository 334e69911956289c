//! Unpacked package processing.
//!
//! Applies the manifest patch and the module cache patch to one unpacked
//! IPA. Both steps always run, in that order.
//!
//! Errors from either step are recoverable: they are reported at error
//! level and kept in the returned [`PackageReport`], but never propagated.
//! The batch pipeline continues with repacking no matter what happened here.

use crate::config::PatchConfig;
use crate::manifest::{patch_manifest, ManifestOutcome};
use crate::modules::{patch_directory, DirectoryOutcome};
use crate::report::Reporter;
use crate::Result;
use std::path::Path;

/// Results of both patch steps for one package.
#[derive(Debug)]
pub struct PackageReport {
    pub manifest: Result<ManifestOutcome>,
    pub modules: Result<DirectoryOutcome>,
}

impl PackageReport {
    /// True when neither step failed outright and no entry failed to rename.
    pub fn is_clean(&self) -> bool {
        let modules_clean = match &self.modules {
            Ok(DirectoryOutcome::Patched { failures, .. }) => failures.is_empty(),
            Ok(DirectoryOutcome::Missing) => true,
            Err(_) => false,
        };
        self.manifest.is_ok() && modules_clean
    }
}

/// Patch the package unpacked at `unpacked_root`.
pub fn process_package(
    unpacked_root: impl AsRef<Path>,
    config: &PatchConfig,
    reporter: &dyn Reporter,
) -> PackageReport {
    let unpacked_root = unpacked_root.as_ref();
    let patched_name = config.patched_name();

    let manifest = patch_manifest(
        config.manifest_path(unpacked_root),
        config.get_target_token(),
        &patched_name,
        reporter,
    );
    if let Err(e) = &manifest {
        reporter.error(&e.to_string());
    }

    let modules = patch_directory(
        config.module_cache_path(unpacked_root),
        config.get_target_token(),
        &patched_name,
        reporter,
    );
    if let Err(e) = &modules {
        reporter.error(&format!("{e}. Skipping {} rename.", config.get_target_token()));
    }

    PackageReport { manifest, modules }
}
