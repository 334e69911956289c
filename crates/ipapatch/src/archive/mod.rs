//! Archive codec.
//!
//! Unpacks an IPA (a ZIP archive) into a directory tree and packs a
//! directory tree back into an archive. Both directions preserve relative
//! paths, so `unpack` followed by `pack` produces the same entry set.

pub mod extract;
pub mod pack;

pub use extract::{unpack, validate_archive};
pub use pack::{pack, CompressionLevel};
