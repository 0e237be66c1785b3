//! HTTP transport used for metadata probes, page fetches and ranged downloads
//!
//! This module handles:
//! - Building the HTTP client with the configured user agent and timeouts
//! - HEAD requests to learn a target's total size
//! - One-shot GET requests for text payloads (listing JSON, item pages)
//! - Ranged GET requests whose bodies are streamed chunk by chunk

use crate::config::DownloadConfig;
use crate::download::chunk::ChunkRange;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, RANGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;

/// Extra request headers, applied in key order
pub type HeaderList = BTreeMap<String, String>;

/// Incrementally readable response body
#[async_trait]
pub trait BodyStream: Send {
    /// Returns the next piece of the body, or `None` at the end
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Network operations the crawler and downloader depend on
#[async_trait]
pub trait Transport: Send + Sync {
    /// Total size of the target as reported by a metadata-only request
    async fn content_length(&self, url: &str, headers: &HeaderList) -> Result<Option<u64>>;

    /// Fetches a whole response body as text
    async fn get_text(&self, url: &str, headers: &HeaderList) -> Result<String>;

    /// Starts a ranged GET and returns the streaming body
    async fn get_range(
        &self,
        url: &str,
        headers: &HeaderList,
        range: ChunkRange,
    ) -> Result<Box<dyn BodyStream>>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The download configuration (user agent, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &DownloadConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Transport` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

/// Ranged GET that asks for the stored bytes, never a re-encoded body
fn range_request(client: &Client, url: &str, headers: &HeaderList, range: ChunkRange) -> RequestBuilder {
    apply_headers(client.get(url), headers)
        .header(ACCEPT_ENCODING, "identity")
        .header(RANGE, range.header_value())
}

fn apply_headers(mut request: RequestBuilder, headers: &HeaderList) -> RequestBuilder {
    for (name, value) in headers {
        if !value.is_empty() {
            request = request.header(name.as_str(), value.as_str());
        }
    }
    request
}

#[async_trait]
impl Transport for HttpTransport {
    async fn content_length(&self, url: &str, headers: &HeaderList) -> Result<Option<u64>> {
        // Identity encoding so the reported length is the length on disk.
        let request = apply_headers(self.client.head(url), headers).header(ACCEPT_ENCODING, "identity");
        let response = self.send(url, request).await?;

        Ok(response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok()))
    }

    async fn get_text(&self, url: &str, headers: &HeaderList) -> Result<String> {
        let request = apply_headers(self.client.get(url), headers);
        let response = self.send(url, request).await?;
        response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })
    }

    async fn get_range(
        &self,
        url: &str,
        headers: &HeaderList,
        range: ChunkRange,
    ) -> Result<Box<dyn BodyStream>> {
        let request = range_request(&self.client, url, headers, range);
        let response = self.send(url, request).await?;

        // A server that ignores Range sends the whole body from byte 0, which
        // is only usable for the first chunk.
        if response.status() != StatusCode::PARTIAL_CONTENT && range.start != 0 {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(Box::new(ResponseBody {
            url: url.to_string(),
            response,
        }))
    }
}

struct ResponseBody {
    url: String,
    response: Response,
}

#[async_trait]
impl BodyStream for ResponseBody {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|source| HarvestError::Http {
                url: self.url.clone(),
                source,
            })?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}
