//! Patch configuration.
//!
//! The packaged application name and the nested layout inside an unpacked IPA
//! are declared here once and shared by every component.

use crate::archive::CompressionLevel;
use std::path::{Path, PathBuf};

/// Application bundle patched by default.
pub const DEFAULT_APP_NAME: &str = "Discord.app";

/// Dependency token whose references are repointed by default.
pub const DEFAULT_TARGET_TOKEN: &str = "@react-navigation+elements";

/// Suffix appended to the target token to form the patched name.
pub const PATCHED_SUFFIX: &str = "@patched";

/// Extension of the archives picked up by the batch pipeline.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "ipa";

/// Extension an archive carries while it is being processed.
pub const ZIP_EXTENSION: &str = "zip";

/// Top-level directory holding the app bundle inside an IPA.
pub const PAYLOAD_DIR: &str = "Payload";

/// Hash manifest, relative to the app bundle.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Module cache directory, relative to the app bundle.
pub const MODULE_CACHE_PATH: [&str; 3] = ["assets", "_node_modules", ".pnpm"];

/// Settings for a patch run, with a builder-style API.
///
/// # Examples
///
/// ```
/// use ipapatch::PatchConfig;
///
/// let config = PatchConfig::new()
///     .app_name("Example.app")
///     .compression_level(9);
/// assert_eq!(config.patched_name(), "@react-navigation+elements@patched");
/// assert_eq!(config.get_compression_level().level(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct PatchConfig {
    app_name: String,
    target_token: String,
    archive_extension: String,
    compression_level: CompressionLevel,
}

impl PatchConfig {
    /// Create a configuration with the default target.
    pub fn new() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            target_token: DEFAULT_TARGET_TOKEN.to_string(),
            archive_extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            compression_level: CompressionLevel::DEFAULT,
        }
    }

    /// Set the app bundle directory name under `Payload/` (e.g. `MyApp.app`).
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the dependency token to repoint.
    pub fn target_token(mut self, token: impl Into<String>) -> Self {
        self.target_token = token.into();
        self
    }

    /// Set the extension of the archives to discover, without the dot.
    pub fn archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = extension.into();
        self
    }

    /// Set ZIP compression level for repacked archives (0-9).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = CompressionLevel::new(level);
        self
    }

    pub fn get_app_name(&self) -> &str {
        &self.app_name
    }

    pub fn get_target_token(&self) -> &str {
        &self.target_token
    }

    pub fn get_archive_extension(&self) -> &str {
        &self.archive_extension
    }

    pub fn get_compression_level(&self) -> CompressionLevel {
        self.compression_level
    }

    /// The canonical replacement for the target token, `<token>@patched`.
    pub fn patched_name(&self) -> String {
        format!("{}{}", self.target_token, PATCHED_SUFFIX)
    }

    /// `<root>/Payload/<AppName>`
    pub fn app_bundle_path(&self, root: &Path) -> PathBuf {
        root.join(PAYLOAD_DIR).join(&self.app_name)
    }

    /// `<root>/Payload/<AppName>/manifest.json`
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        self.app_bundle_path(root).join(MANIFEST_FILE)
    }

    /// `<root>/Payload/<AppName>/assets/_node_modules/.pnpm`
    pub fn module_cache_path(&self, root: &Path) -> PathBuf {
        MODULE_CACHE_PATH
            .iter()
            .fold(self.app_bundle_path(root), |path, segment| path.join(segment))
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self::new()
    }
}
