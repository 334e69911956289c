//! Archive extraction.
//!
//! Unpacks a ZIP/IPA archive into a directory, keeping the relative layout.

use crate::{Error, Result};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// Unpack an archive into `dest_dir`.
///
/// Every entry lands at its relative path under `dest_dir`; directory
/// entries are created even when empty. On Unix, file permissions and
/// symlinks are restored. Entries whose names would escape `dest_dir`
/// (absolute paths, `..`) are skipped.
///
/// # Errors
///
/// Returns [`Error::CorruptArchive`] if the file is not a ZIP archive, if a
/// symlink entry points outside the archive, or if an entry would be written
/// through a symlink to somewhere outside `dest_dir`. Returns [`Error::Io`]
/// if the file is missing or extraction fails on disk.
pub fn unpack(archive_path: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<()> {
    let archive_path = archive_path.as_ref();
    let dest_dir = dest_dir.as_ref();

    validate_archive(archive_path)?;

    let file = File::open(archive_path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    let cursor = Cursor::new(&mmap[..]);
    let mut archive = ZipArchive::new(cursor).map_err(|e| Error::CorruptArchive {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    fs::create_dir_all(dest_dir)?;
    let root = dest_dir.canonicalize()?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let relative: PathBuf = match entry.enclosed_name() {
            Some(path) => path,
            None => continue,
        };
        let outpath = dest_dir.join(&relative);

        // An earlier symlink entry must not redirect this one out of dest_dir
        if !resolves_within(&root, &outpath)? {
            return Err(Error::CorruptArchive {
                path: archive_path.to_path_buf(),
                reason: format!("{} escapes the destination", relative.display()),
            });
        }

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }

        #[cfg(unix)]
        let unix_mode = entry.unix_mode();

        #[cfg(unix)]
        if unix_mode
            .map(|mode| (mode & 0o170000) == 0o120000)
            .unwrap_or(false)
        {
            let mut target = String::new();
            entry.read_to_string(&mut target)?;

            if !link_stays_within(&relative, Path::new(&target)) {
                return Err(Error::CorruptArchive {
                    path: archive_path.to_path_buf(),
                    reason: format!("{} links outside the archive", relative.display()),
                });
            }

            if outpath.symlink_metadata().is_ok() {
                fs::remove_file(&outpath)?;
            }

            std::os::unix::fs::symlink(&target, &outpath)?;
            continue;
        }

        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = unix_mode {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode & 0o7777))?;
            }
        }
    }

    Ok(())
}

/// Whether the deepest existing ancestor of `path` resolves inside `root`.
///
/// Only that ancestor can be a symlink; everything below it is created
/// fresh by extraction.
fn resolves_within(root: &Path, path: &Path) -> Result<bool> {
    match path.ancestors().find(|p| p.symlink_metadata().is_ok()) {
        Some(existing) => Ok(existing.canonicalize()?.starts_with(root)),
        None => Ok(false),
    }
}

/// Whether a symlink at archive path `link` pointing at `target` stays
/// inside the archive root, judged lexically.
fn link_stays_within(link: &Path, target: &Path) -> bool {
    let mut depth: usize = 0;
    let parent = link.parent().unwrap_or(Path::new(""));

    for component in parent.components().chain(target.components()) {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }

    true
}

/// Check that `archive_path` exists and starts with a ZIP signature.
///
/// This is a presence check, not an integrity check: entry contents and
/// CRCs are not verified.
pub fn validate_archive(archive_path: impl AsRef<Path>) -> Result<()> {
    let archive_path = archive_path.as_ref();

    if !archive_path.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Archive not found: {}", archive_path.display()),
        )));
    }

    let mut file = File::open(archive_path)?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic[0..2] != b"PK" {
        return Err(Error::CorruptArchive {
            path: archive_path.to_path_buf(),
            reason: "missing ZIP signature".into(),
        });
    }

    Ok(())
}
