use crate::config::{FeedConfig, TIMESTAMP_PLACEHOLDER};
use crate::error::{NewsCrawlError, Result};
use crate::schedule::Interval;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Retrieves the compressed batch published for one interval.
///
/// Implementations must report an unpublished batch as
/// [`NewsCrawlError::BatchMissing`] so the caller can skip the interval quietly.
pub trait BatchSource {
    /// Where the batch for `interval` lives, for logging.
    fn locate(&self, interval: &Interval) -> String;

    fn fetch(&self, interval: &Interval, destination: &Path) -> Result<()>;
}

pub struct HttpBatchSource {
    client: Client,
    url_template: String,
}

impl HttpBatchSource {
    pub fn new(url_template: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("newscrawl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NewsCrawlError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }
}

impl BatchSource for HttpBatchSource {
    fn locate(&self, interval: &Interval) -> String {
        self.url_template
            .replace(TIMESTAMP_PLACEHOLDER, &interval.timestamp())
    }

    fn fetch(&self, interval: &Interval, destination: &Path) -> Result<()> {
        let url = self.locate(interval);
        let transport = |message: String| NewsCrawlError::Transport {
            url: url.clone(),
            message,
        };

        let mut response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(NewsCrawlError::BatchMissing { url: url.clone() });
        }
        if !status.is_success() {
            return Err(transport(format!("HTTP {}", status)));
        }

        let mut file = File::create(destination)?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| transport(e.to_string()))?;

        debug!(%url, bytes, "batch downloaded");
        Ok(())
    }
}

/// Reads batches from a local mirror laid out by a path template.
pub struct LocalBatchSource {
    path_template: String,
}

impl LocalBatchSource {
    pub fn new(path_template: &str) -> Self {
        let path_template = path_template
            .strip_prefix("file://")
            .unwrap_or(path_template)
            .to_string();
        Self { path_template }
    }

    fn batch_path(&self, interval: &Interval) -> PathBuf {
        PathBuf::from(
            self.path_template
                .replace(TIMESTAMP_PLACEHOLDER, &interval.timestamp()),
        )
    }
}

impl BatchSource for LocalBatchSource {
    fn locate(&self, interval: &Interval) -> String {
        self.batch_path(interval).display().to_string()
    }

    fn fetch(&self, interval: &Interval, destination: &Path) -> Result<()> {
        let source = self.batch_path(interval);
        if !source.is_file() {
            return Err(NewsCrawlError::BatchMissing {
                url: source.display().to_string(),
            });
        }
        fs::copy(&source, destination)?;
        Ok(())
    }
}

/// HTTP(S) templates download from the network; anything else is a local mirror.
pub fn batch_source_for(feed: &FeedConfig) -> Result<Box<dyn BatchSource + Send>> {
    let template = feed.url_template.as_str();
    if template.starts_with("http://") || template.starts_with("https://") {
        let source = HttpBatchSource::new(template, Duration::from_secs(feed.timeout))?;
        Ok(Box::new(source))
    } else {
        Ok(Box::new(LocalBatchSource::new(template)))
    }
}
