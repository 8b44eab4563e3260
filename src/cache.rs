//! Resolve-then-install orchestration

use crate::download::Fetch;
use crate::error::{Error, Result};
use crate::install::install_archive;
use crate::project::Resolver;
use crate::store::CacheStore;
use crate::types::{CachedBinary, Project};

/// Default root for release downloads.
pub const DEFAULT_RELEASE_HOST: &str = "https://github.com";

/// Stores and retrieves project binaries, downloading release tarballs on a
/// cache miss.
pub struct Cache {
    resolver: Resolver,
    store: CacheStore,
    fetcher: Box<dyn Fetch>,
    release_host: String,
}

impl Cache {
    pub fn new(resolver: Resolver, store: CacheStore, fetcher: Box<dyn Fetch>) -> Self {
        Self {
            resolver,
            store,
            fetcher,
            release_host: DEFAULT_RELEASE_HOST.to_string(),
        }
    }

    pub fn with_release_host(mut self, host: &str) -> Self {
        self.release_host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn resolve(&self, identifier: &str, version: &str) -> Result<Project> {
        self.resolver.resolve(identifier, version)
    }

    /// `{host}/{owner}/{name}/releases/download/{tag}/{tarball}`
    pub fn download_url(&self, project: &Project) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.release_host,
            project.full_name,
            project.raw_version,
            project.tarball_name()
        )
    }

    /// Returns the cached binary for `identifier` at `version`, installing it
    /// from the release host first if it is not on disk.
    pub fn get_or_install(&self, identifier: &str, version: &str) -> Result<CachedBinary> {
        let project = self.resolver.resolve(identifier, version)?;
        let path = self.store.target_path(&project);

        if self.store.exists(&path) {
            tracing::info!("{} is already installed at {}", project, path.display());
            return Ok(CachedBinary { project, path });
        }

        let url = self.download_url(&project);
        tracing::info!("Installing {} from {}", project, url);

        let body = self.fetcher.fetch(&url)?;
        install_archive(body, &project.binary_name(), &project.name, &path).map_err(|e| {
            Error::Unpack {
                project: project.to_string(),
                url: url.clone(),
                source: Box::new(e),
            }
        })?;

        Ok(CachedBinary { project, path })
    }
}
