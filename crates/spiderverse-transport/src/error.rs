/// Errors that can occur in the transport layer.
///
/// Every variant means the request did not produce a usable JSON body.
/// A body that parsed but says `"success": false` is not a transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured base address is not a valid URL.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// No response arrived within the configured timeout.
    ///
    /// The request may still have reached the server.
    #[error("request timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    /// The response body is not JSON.
    #[error("invalid response body: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    /// An error reported by the HTTP client.
    #[cfg(feature = "http")]
    #[error("http client error: {0}")]
    Http(#[source] reqwest::Error),
}
