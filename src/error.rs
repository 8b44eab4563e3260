use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown project '{identifier}'. it should have a format like `netlify/binrc`")]
    UnknownProject { identifier: String },

    #[error("unknown project version for {project}: pass a version or set {env_key}")]
    UnknownVersion { project: String, env_key: String },

    #[error("invalid version '{version}' for {project}: {source}")]
    InvalidVersion {
        project: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("no naming template for {project} matches version {version}")]
    NoMatchingTemplate { project: String, version: String },

    #[error("invalid version range '{range}' for {project}: {source}")]
    InvalidRange {
        project: String,
        range: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("error downloading {url} - binary doesn't seem to exist (status {status})")]
    DownloadFailed { url: String, status: u16 },

    #[error("error downloading {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not create HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("error unpacking file for {project}, from {url}: {source}")]
    Unpack {
        project: String,
        url: String,
        #[source]
        source: Box<Error>,
    },

    #[error("error unpacking archive: {source}")]
    CorruptArchive {
        #[source]
        source: io::Error,
    },

    #[error("binary not found in archive, looked for '{expected}' and '{fallback}'")]
    BinaryNotFoundInArchive { expected: String, fallback: String },

    #[error("error installing {}: {source}", path.display())]
    InstallFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn install(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::InstallFailed {
            path: path.into(),
            source,
        }
    }
}
