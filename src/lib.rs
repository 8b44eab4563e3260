//! Resolve a project and version to a cached executable, downloading and
//! unpacking its release tarball when it is not on disk yet.
//!
//! ```no_run
//! use binrc::{AliasTable, Cache, CacheStore, HttpFetcher, Resolver, TemplateTable};
//!
//! # fn main() -> binrc::Result<()> {
//! let resolver = Resolver::new(TemplateTable::new(), AliasTable::builtin());
//! let cache = Cache::new(resolver, CacheStore::new("/tmp/binrc"), Box::new(HttpFetcher::new()?));
//! let hugo = cache.get_or_install("hugo", "0.68.3")?;
//! println!("{}", hugo.path.display());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod install;
pub mod project;
pub mod store;
pub mod template;
pub mod types;


pub use cache::Cache;
pub use download::{Fetch, HttpFetcher};
pub use error::{Error, Result};
pub use project::{AliasTable, EnvFallback, Resolver, VersionFallback};
pub use store::CacheStore;
pub use template::{NamePattern, TemplateRule, TemplateTable};
pub use types::{CachedBinary, Project};
