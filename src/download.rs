use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::blocking::Client;
use std::io::Read;

pub const USER_AGENT: &str = concat!("binrc/", env!("CARGO_PKG_VERSION"));

/// Retrieves release artifacts.
pub trait Fetch {
    /// GETs `url` once and returns the response body as a blocking reader.
    fn fetch(&self, url: &str) -> Result<Box<dyn Read + Send>>;
}

pub struct HttpFetcher {
    client: Client,
    progress: bool,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|source| Error::Client { source })?;
        Ok(Self {
            client,
            progress: true,
        })
    }

    /// Show a progress bar on stderr while the body is read.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, url: &str, total_size: Option<u64>) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let filename = url.rsplit('/').next().unwrap_or(url).to_string();
        let pb = match total_size {
            Some(size) => {
                let pb = ProgressBar::new(size);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_message(format!("Downloading {}", filename));
        pb
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        tracing::info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| Error::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let pb = self.progress_bar(url, response.content_length());
        Ok(Box::new(ProgressReader { inner: pb.wrap_read(response), pb }))
    }
}

/// Clears the progress bar once the body is exhausted or dropped.
struct ProgressReader<R> {
    inner: R,
    pb: ProgressBar,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.pb.finish_and_clear();
        }
        Ok(n)
    }
}

impl<R> Drop for ProgressReader<R> {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
