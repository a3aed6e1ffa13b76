use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::{MailbotError, Result};
use crate::models::Snapshot;

/// Produces one snapshot per call. Implementations do not retry.
pub trait ImageSource {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot>> + Send;

    /// URL or path, for logs and errors.
    fn describe(&self) -> String;
}

/// GETs the snapshot from a camera's HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| MailbotError::config(format!("invalid snapshot URL {url:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MailbotError::config(format!(
                "snapshot URL must be http or https, got {}",
                url.scheme()
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailbotError::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { url, timeout, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn transport_error(&self, e: reqwest::Error) -> MailbotError {
        let reason = if e.is_timeout() {
            format!("timed out after {:?}", self.timeout)
        } else if let Some(status) = e.status() {
            format!("server answered {status}")
        } else {
            e.to_string()
        };
        MailbotError::retrieval(self.url.as_str(), reason)
    }
}

impl ImageSource for HttpSource {
    async fn fetch(&self) -> Result<Snapshot> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| self.transport_error(e))?;

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        if bytes.is_empty() {
            return Err(MailbotError::retrieval(self.url.as_str(), "empty response body"));
        }

        log::debug!("fetched {} bytes from {}", bytes.len(), self.url);
        Ok(Snapshot::new(bytes.to_vec(), self.url.as_str()))
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Reads a saved snapshot from disk; handy for tuning against a known frame.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileSource {
    async fn fetch(&self) -> Result<Snapshot> {
        let origin = self.path.display().to_string();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| MailbotError::retrieval(&origin, e))?;
        if bytes.is_empty() {
            return Err(MailbotError::retrieval(origin, "file is empty"));
        }
        Ok(Snapshot::new(bytes, origin))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serves the same bytes on every fetch.
#[derive(Debug, Clone)]
pub struct StaticSource {
    bytes: Vec<u8>,
    origin: String,
}

impl StaticSource {
    pub fn new(bytes: Vec<u8>, origin: impl Into<String>) -> Self {
        Self {
            bytes,
            origin: origin.into(),
        }
    }
}

impl ImageSource for StaticSource {
    async fn fetch(&self) -> Result<Snapshot> {
        if self.bytes.is_empty() {
            return Err(MailbotError::retrieval(&self.origin, "no bytes"));
        }
        Ok(Snapshot::new(self.bytes.clone(), &self.origin))
    }

    fn describe(&self) -> String {
        self.origin.clone()
    }
}

/// Source picked at startup from the command line.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Http(HttpSource),
    File(FileSource),
}

impl ImageSource for ConfiguredSource {
    async fn fetch(&self) -> Result<Snapshot> {
        match self {
            ConfiguredSource::Http(source) => source.fetch().await,
            ConfiguredSource::File(source) => source.fetch().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            ConfiguredSource::Http(source) => source.describe(),
            ConfiguredSource::File(source) => source.describe(),
        }
    }
}
