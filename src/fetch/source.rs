use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;

use super::{BasicClient, HttpClient, fetch_bytes};

/// Something a dataset can be loaded from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable locator, used in logs and error messages.
    fn describe(&self) -> String;

    async fn load(&self) -> Result<Vec<u8>>;
}

/// A dataset served over HTTP(S).
pub struct HttpSource<C = BasicClient> {
    client: C,
    url: String,
}

impl HttpSource<BasicClient> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(BasicClient::new(), url)
    }
}

impl<C: HttpClient> HttpSource<C> {
    pub fn with_client(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> DataSource for HttpSource<C> {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn load(&self) -> Result<Vec<u8>> {
        fetch_bytes(&self.client, &self.url)
            .await
            .with_context(|| format!("failed to fetch {}", self.url))
    }
}

/// A dataset on the local filesystem. Files ending in `.gz` are gunzipped.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_gzip(&self) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some("gz")
    }
}

#[async_trait]
impl DataSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<u8>> {
        let raw = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        if !self.is_gzip() {
            return Ok(raw);
        }

        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .with_context(|| format!("failed to decompress {}", self.path.display()))?;
        Ok(decoded)
    }
}

/// An in-memory dataset. Handy for fixtures and for callers that already
/// hold the payload.
pub struct StaticSource {
    label: String,
    bytes: Vec<u8>,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes,
        }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn load(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Picks an HTTP source for `http(s)://` locators and a file source otherwise.
pub fn source_for(locator: &str) -> Box<dyn DataSource> {
    if locator.starts_with("http://") || locator.starts_with("https://") {
        Box::new(HttpSource::new(locator))
    } else {
        Box::new(FileSource::new(locator))
    }
}
