//! HTTP [`RemoteStore`] implementation using `reqwest`.

use std::time::Duration;

use serde_json::Value;

use crate::{Method, RemoteStore, RequestOptions, TransportError};

/// Base address of the hosted characters API.
pub const DEFAULT_API_URL: &str =
    "https://sandybrown-skunk-481229.hostingersite.com/api";

/// Configuration for [`HttpRemoteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStoreConfig {
    /// Address every request path is appended to. A trailing slash is
    /// ignored.
    pub base_url: String,

    /// How long to wait for a response before giving up.
    ///
    /// Giving up only stops the waiting: a request that already reached
    /// the server is not retracted. Default: 30 seconds.
    pub timeout_secs: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpStoreConfig {
    /// Sets the base address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the response timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// A [`RemoteStore`] that sends JSON over HTTP.
///
/// The body is parsed as JSON whatever the status code: the API reports
/// failures through its own `success` flag, often with a 4xx status.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpRemoteStore {
    /// Builds a store for the configured base address.
    ///
    /// # Errors
    /// - [`TransportError::InvalidUrl`] if `base_url` doesn't parse
    /// - [`TransportError::Http`] if the HTTP client can't be built
    pub fn new(config: HttpStoreConfig) -> Result<Self, TransportError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Returns the base address requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                after_secs: self.timeout_secs,
            }
        } else if e.is_connect() || e.is_request() || e.is_body() {
            TransportError::RequestFailed(e.to_string())
        } else {
            TransportError::Http(e)
        }
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, TransportError> {
        let url = self.url(path);
        let method = match options.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        tracing::debug!(method = %options.method, %url, "sending request");

        let mut request = self
            .client
            .request(method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        tracing::debug!(%status, %url, len = bytes.len(), "response received");

        serde_json::from_slice(&bytes).map_err(TransportError::InvalidResponse)
    }
}
