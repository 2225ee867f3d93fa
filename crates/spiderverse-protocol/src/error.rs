//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means the bytes arrived but didn't have the shape
//! the client expects.

/// Errors that can occur while encoding requests or decoding responses.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a request body failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The response didn't match the expected shape: not an envelope,
    /// missing required fields, wrong data types.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The response parsed but is logically incomplete, e.g. a successful
    /// list response without `data`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
