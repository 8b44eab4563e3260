//! On-disk layout of cached binaries
//!
//! `{root}/binaries/{owner}/{name}/{version}/{name}`. The filesystem is the
//! only record of what is installed.

use crate::types::{InstalledBinary, Project};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const BINARIES_DIR_NAME: &str = "binaries";
pub const STAGING_PREFIX: &str = ".binrc-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn binaries_dir(&self) -> PathBuf {
        self.root.join(BINARIES_DIR_NAME)
    }

    pub fn target_path(&self, project: &Project) -> PathBuf {
        let mut path = self.binaries_dir();
        path.push(&project.owner);
        path.push(&project.name);
        path.push(&project.raw_version);
        path.push(&project.name);
        path
    }

    /// A regular file at `path` counts as cached, executable or not.
    pub fn exists(&self, path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                if !is_executable(&meta) {
                    tracing::warn!("{} is cached but not executable", path.display());
                }
                true
            }
            Ok(_) => {
                tracing::debug!("{} exists but is not a regular file", path.display());
                false
            }
            Err(_) => false,
        }
    }

    /// Every binary laid out under the store, sorted by project and version.
    pub fn installed(&self) -> Vec<InstalledBinary> {
        let base = self.binaries_dir();
        let mut found = Vec::new();

        for entry in WalkDir::new(&base)
            .min_depth(4)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&base) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();

            if parts.iter().any(|p| p.starts_with(STAGING_PREFIX)) {
                continue;
            }
            if let Some((name, version)) = split_entry(&parts) {
                found.push(InstalledBinary {
                    full_name: format!("{}/{}", parts[0], name),
                    version,
                    path: entry.path().to_path_buf(),
                });
            }
        }

        found.sort_by(|a, b| {
            a.full_name
                .cmp(&b.full_name)
                .then_with(|| a.version.cmp(&b.version))
        });
        found
    }
}

/// Splits `owner / name.. / version / name..` into name and version. The
/// name may span several components and appears twice.
fn split_entry(parts: &[String]) -> Option<(String, String)> {
    (2..parts.len().saturating_sub(1)).find_map(|i| {
        let (name, rest) = (&parts[1..i], &parts[i + 1..]);
        (parts[i].starts_with('v') && name == rest).then(|| (name.join("/"), parts[i].clone()))
    })
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}
