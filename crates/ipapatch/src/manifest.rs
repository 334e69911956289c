//! Hash manifest patching.
//!
//! An app bundle's `manifest.json` maps package-relative paths to content
//! hashes under a top-level `hashes` object. When a dependency directory is
//! renamed, every key that passes through it has to be rewritten too.
//!
//! A key is split on `/` and every segment containing the target token is
//! replaced as a whole by the patched name:
//!
//! ```
//! use ipapatch::manifest::patch_key;
//!
//! let key = "a/@react-navigation+elements@1.2.3/index.js";
//! assert_eq!(
//!     patch_key(key, "@react-navigation+elements", "@react-navigation+elements@patched"),
//!     Some("a/@react-navigation+elements@patched/index.js".to_string())
//! );
//! ```

use crate::report::Reporter;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Top-level field holding the hash table.
pub const HASHES_FIELD: &str = "hashes";

/// What [`patch_manifest`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestOutcome {
    /// No manifest file; nothing to do.
    Missing,
    /// The manifest has no `hashes` object; nothing to do.
    NoHashes,
    /// The manifest was rewritten. `renamed` counts the keys that changed.
    Written { renamed: usize },
}

/// Rewrite `key` if any of its `/`-separated segments contains `target_token`.
///
/// Returns `None` when no segment matches.
pub fn patch_key(key: &str, target_token: &str, patched_name: &str) -> Option<String> {
    let mut matched = false;
    let segments: Vec<&str> = key
        .split('/')
        .map(|segment| {
            if segment.contains(target_token) {
                matched = true;
                patched_name
            } else {
                segment
            }
        })
        .collect();

    matched.then(|| segments.join("/"))
}

/// Rebuild a hash table with every matching key rewritten.
///
/// Values move with their keys unchanged. When two keys collapse into the
/// same patched key, the one later in iteration order wins; the entry keeps
/// the position of the first insertion.
pub fn patch_hashes(
    hashes: Map<String, Value>,
    target_token: &str,
    patched_name: &str,
    reporter: &dyn Reporter,
) -> (Map<String, Value>, usize) {
    let mut patched = Map::with_capacity(hashes.len());
    let mut renamed = 0;

    for (key, value) in hashes {
        match patch_key(&key, target_token, patched_name) {
            Some(new_key) => {
                reporter.debug(&format!("Original key: {key}"));
                reporter.debug(&format!("Updated key: {new_key}"));
                renamed += 1;
                patched.insert(new_key, value);
            }
            None => {
                patched.insert(key, value);
            }
        }
    }

    (patched, renamed)
}

/// Patch the `hashes` table of the manifest at `manifest_path` in place.
///
/// The file is rewritten with two-space indentation whenever it contains a
/// `hashes` object, even if no key matched. Fields other than `hashes` are
/// written back unchanged.
///
/// # Errors
///
/// - [`Error::ManifestParse`] if the file is not valid JSON; the file is not
///   modified.
/// - [`Error::ManifestWrite`] if the rewritten manifest cannot be written.
/// - [`Error::Io`] if the file exists but cannot be read.
pub fn patch_manifest(
    manifest_path: impl AsRef<Path>,
    target_token: &str,
    patched_name: &str,
    reporter: &dyn Reporter,
) -> Result<ManifestOutcome> {
    let manifest_path = manifest_path.as_ref();

    if !manifest_path.exists() {
        reporter.debug("Manifest file does not exist, no need to rename.");
        return Ok(ManifestOutcome::Missing);
    }

    let data = fs::read(manifest_path)?;
    let mut manifest: Value = serde_json::from_slice(&data).map_err(|source| Error::ManifestParse {
        path: manifest_path.to_path_buf(),
        source,
    })?;

    let hashes = match manifest
        .as_object_mut()
        .and_then(|object| object.get_mut(HASHES_FIELD))
    {
        Some(Value::Object(hashes)) => std::mem::take(hashes),
        _ => {
            reporter.info(&format!(
                "No hashes found in {}. Skipping {target_token} rename.",
                manifest_path.display()
            ));
            return Ok(ManifestOutcome::NoHashes);
        }
    };

    let (patched, renamed) = patch_hashes(hashes, target_token, patched_name, reporter);

    if let Some(object) = manifest.as_object_mut() {
        object.insert(HASHES_FIELD.to_string(), Value::Object(patched));
    }

    let output = serde_json::to_vec_pretty(&manifest).map_err(|e| Error::ManifestWrite {
        path: manifest_path.to_path_buf(),
        source: e.into(),
    })?;

    make_writable(manifest_path)
        .and_then(|()| fs::write(manifest_path, output))
        .map_err(|source| Error::ManifestWrite {
            path: manifest_path.to_path_buf(),
            source,
        })?;

    reporter.info(&format!("Wrote modified {}", manifest_path.display()));

    Ok(ManifestOutcome::Written { renamed })
}

/// Give the owner write access; unpacking restores archived modes, and
/// bundles sometimes ship read-only files.
fn make_writable(path: &Path) -> std::io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    if !permissions.readonly() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    permissions.set_readonly(false);

    fs::set_permissions(path, permissions)
}
