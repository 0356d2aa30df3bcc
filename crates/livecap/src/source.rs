//! Live stream sources.
//!
//! The capture loop only needs "issue a GET with these headers, hand me a
//! status and a byte reader". [`HttpSource`] does that over reqwest; tests
//! plug in scripted sources.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::error::SourceError;

/// Request headers, forwarded to the source unmodified.
pub type Headers = HashMap<String, String>;

/// Response body. Dropping it closes the underlying connection.
pub type BodyReader = Pin<Box<dyn AsyncRead + Send>>;

/// Status line and body of an opened stream.
pub struct SourceResponse {
    pub status: u16,
    pub reason: String,
    pub body: BodyReader,
}

impl SourceResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

impl std::fmt::Debug for SourceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Something that can open a live byte stream.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Issue `GET url` with `headers`.
    ///
    /// Non-success statuses are returned as a response, not as an error; the
    /// error path is for requests that could not be made at all.
    async fn open(&self, url: &str, headers: &Headers) -> Result<SourceResponse, SourceError>;
}

#[async_trait]
impl<S: StreamSource + ?Sized> StreamSource for std::sync::Arc<S> {
    async fn open(&self, url: &str, headers: &Headers) -> Result<SourceResponse, SourceError> {
        (**self).open(url, headers).await
    }
}

/// Client settings for [`HttpSource::from_settings`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Bounds connection setup only; a live body has no natural deadline.
    pub connect_timeout: Duration,
    pub proxy: Option<String>,
    pub accept_invalid_certs: bool,
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            proxy: None,
            accept_invalid_certs: false,
            user_agent: None,
        }
    }
}

/// reqwest-backed [`StreamSource`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Wrap an existing client, e.g. one shared with the rest of the process.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs);

        if let Some(proxy) = &settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        Ok(Self::new(builder.build()?))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn header_map(headers: &Headers) -> Result<HeaderMap, SourceError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        map.append(name, value);
    }
    Ok(map)
}

#[async_trait]
impl StreamSource for HttpSource {
    async fn open(&self, url: &str, headers: &Headers) -> Result<SourceResponse, SourceError> {
        let response = self
            .client
            .get(url)
            .headers(header_map(headers)?)
            .send()
            .await?;

        let status = response.status();
        debug!("live stream {} responded {}", url, status);

        let body = response.bytes_stream().map_err(io::Error::other);

        Ok(SourceResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: Box::pin(StreamReader::new(body)),
        })
    }
}
