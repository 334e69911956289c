//! Patch the React Navigation dependency layout inside iOS IPA archives.
//!
//! Each archive in a directory is unpacked, its `manifest.json` hash keys and
//! pnpm module cache entries for the target dependency are repointed to a
//! `<token>@patched` variant, and the archive is repacked under its original
//! name.
//!
//! # Examples
//!
//! ```no_run
//! use ipapatch::{BatchPipeline, LogReporter, PatchConfig};
//!
//! let config = PatchConfig::new().compression_level(9);
//! let count = BatchPipeline::new(&config, &LogReporter).run(".")?;
//! println!("Patched {count} archives");
//! # Ok::<(), ipapatch::Error>(())
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod manifest;
pub mod modules;
pub mod package;
pub mod pipeline;
pub mod report;

pub use archive::{pack, unpack, validate_archive, CompressionLevel};
pub use config::PatchConfig;
pub use error::Error;
pub use manifest::{patch_manifest, ManifestOutcome};
pub use modules::{patch_directory, DirectoryOutcome};
pub use package::{process_package, PackageReport};
pub use pipeline::{BatchPipeline, Stage};
pub use report::{LogReporter, MemoryReporter, Reporter};

pub type Result<T> = std::result::Result<T, Error>;
