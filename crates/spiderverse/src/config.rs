//! Client configuration.

use spiderverse_transport::HttpStoreConfig;

use crate::ClientError;

/// Environment variable overriding the API base URL.
pub const API_URL_VAR: &str = "SPIDERVERSE_API_URL";

/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_VAR: &str = "SPIDERVERSE_TIMEOUT_SECS";

/// Configuration for a [`Client`](crate::Client) built over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientConfig {
    /// Where the characters API lives and how long to wait for it.
    pub store: HttpStoreConfig,
}

impl ClientConfig {
    /// Builds a config from the defaults, overridden by
    /// `SPIDERVERSE_API_URL` and `SPIDERVERSE_TIMEOUT_SECS` when set.
    ///
    /// # Errors
    /// [`ClientError::InvalidConfig`] if the timeout isn't a positive
    /// whole number of seconds.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR).filter(|url| !url.trim().is_empty()) {
            config.store = config.store.with_base_url(url.trim());
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ClientError::InvalidConfig(format!(
                        "{TIMEOUT_VAR} must be a positive number of seconds, got {raw:?}"
                    ))
                })?;
            config.store = config.store.with_timeout_secs(secs);
        }

        Ok(config)
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.store = self.store.with_base_url(url);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.store = self.store.with_timeout_secs(secs);
        self
    }
}
