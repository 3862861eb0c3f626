//! Dataset retrieval.
//!
//! A [`DataSource`] yields the raw bytes of one dataset, either over HTTP
//! through an [`HttpClient`] or from the local filesystem. [`fetch_json`]
//! turns those bytes into typed records.

mod basic;
mod client;
mod source;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use source::{DataSource, FileSource, HttpSource, StaticSource, source_for};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Issues a single GET request and returns the response body.
///
/// # Errors
///
/// Fails on an unparsable URL, a transport error or a non-2xx status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid URL '{url}'"))?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads a source and deserializes its body as JSON.
#[tracing::instrument(skip(source), fields(source = %source.describe()))]
pub async fn fetch_json<T: DeserializeOwned>(source: &dyn DataSource) -> Result<T> {
    let bytes = source.load().await?;
    debug!(bytes = bytes.len(), "Source loaded, parsing JSON");

    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse JSON from {}", source.describe()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        fips: u32,
    }

    #[tokio::test]
    async fn test_fetch_json_parses_static_source() {
        let source = StaticSource::new("rows", br#"[{"fips": 1001}, {"fips": 1003}]"#.to_vec());
        let rows: Vec<Row> = fetch_json(&source).await.unwrap();
        assert_eq!(rows, vec![Row { fips: 1001 }, Row { fips: 1003 }]);
    }

    #[tokio::test]
    async fn test_fetch_json_reports_source_on_parse_error() {
        let source = StaticSource::new("broken", b"{not json".to_vec());
        let err = fetch_json::<Vec<Row>>(&source).await.unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_bad_url() {
        let client = BasicClient::new();
        let result = fetch_bytes(&client, "not a url").await;
        assert!(result.is_err());
    }
}
