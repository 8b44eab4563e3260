//! Archive installation
//!
//! Extracts a gzip+tar stream into a staging directory next to the target
//! and renames the binary into place, so readers of the target path only
//! ever see no file or the complete file.

use crate::error::{Error, Result};
use crate::store::STAGING_PREFIX;
use flate2::read::GzDecoder;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tempfile::TempDir;

/// Installs the binary found in `archive` at `destination`.
///
/// The binary is looked up at `expected` relative to the archive root, then
/// at `fallback` (usually the bare project name) for archives that keep the
/// executable at the top level.
pub fn install_archive<R: Read>(
    archive: R,
    expected: &str,
    fallback: &str,
    destination: &Path,
) -> Result<()> {
    let parent = destination.parent().ok_or_else(|| {
        Error::install(
            destination,
            io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"),
        )
    })?;
    fs::create_dir_all(parent).map_err(|e| Error::install(parent, e))?;

    // Staged next to the parent so the final rename never crosses filesystems.
    let staging_root = parent.parent().unwrap_or(parent);
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(staging_root)
        .map_err(|e| Error::install(staging_root, e))?;
    tracing::debug!("Staging extraction in {}", staging.path().display());

    let result = stage_and_move(archive, &staging, expected, fallback, destination);
    cleanup(staging);
    result
}

fn stage_and_move<R: Read>(
    archive: R,
    staging: &TempDir,
    expected: &str,
    fallback: &str,
    destination: &Path,
) -> Result<()> {
    unpack(archive, staging.path())?;

    let binary = locate_binary(staging.path(), expected, fallback).ok_or_else(|| {
        Error::BinaryNotFoundInArchive {
            expected: expected.to_string(),
            fallback: fallback.to_string(),
        }
    })?;

    fs::rename(&binary, destination).map_err(|e| Error::install(destination, e))?;
    tracing::info!("Installed {}", destination.display());
    Ok(())
}

fn cleanup(staging: TempDir) {
    let path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        tracing::warn!("Could not remove staging directory {}: {}", path.display(), e);
    }
}

fn locate_binary(root: &Path, expected: &str, fallback: &str) -> Option<PathBuf> {
    [expected, fallback]
        .into_iter()
        .filter_map(|rel| safe_relative(Path::new(rel)))
        .map(|rel| root.join(rel))
        .find(|candidate| {
            let found = candidate.is_file();
            tracing::debug!("Looking for binary at {}: {}", candidate.display(), found);
            found
        })
}

/// Streams every entry of a gzip+tar archive into `dest`.
pub fn unpack<R: Read>(archive: R, dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(archive));
    let entries = archive.entries().map_err(corrupt)?;

    for entry in entries {
        let mut entry = entry.map_err(corrupt)?;
        let header_path = entry.path().map_err(corrupt)?.into_owned();

        let Some(relative) = safe_relative(&header_path) else {
            tracing::warn!("Skipping unsafe path in archive: {}", header_path.display());
            continue;
        };
        let target = dest.join(&relative);
        let mode = entry.header().mode().map_err(corrupt)?;

        match entry.header().entry_type() {
            EntryType::Directory => create_dir(&target, mode)?,
            EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::install(parent, e))?;
                }
                write_file(&mut entry, &target, mode)?;
            }
            other => {
                tracing::debug!(
                    "Skipping {:?} entry in archive: {}",
                    other,
                    header_path.display()
                );
            }
        }
    }

    Ok(())
}

fn corrupt(source: io::Error) -> Error {
    Error::CorruptArchive { source }
}

/// Drops archive paths that would land outside the extraction root.
fn safe_relative(path: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

#[cfg(unix)]
fn create_dir(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    // owner rwx is kept so the staging directory can always be removed
    let mode = (mode & 0o7777) | 0o700;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .map_err(|e| Error::install(path, e))?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::install(path, e))
}

#[cfg(not(unix))]
fn create_dir(path: &Path, _mode: u32) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::install(path, e))
}

fn write_file<R: Read>(entry: &mut R, path: &Path, mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path).map_err(|e| Error::install(path, e))?;

    // read errors mean a damaged archive, write errors a local problem
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(corrupt(e)),
        };
        file.write_all(&buf[..n]).map_err(|e| Error::install(path, e))?;
    }
    file.flush().map_err(|e| Error::install(path, e))
}
