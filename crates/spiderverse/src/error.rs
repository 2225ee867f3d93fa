//! Unified error type for the Spider-Verse client.

use spiderverse_collection::{CollectionError, ErrorKind};
use spiderverse_protocol::ProtocolError;
use spiderverse_session::SessionError;
use spiderverse_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `spiderverse` crate, you deal with this single error
/// type instead of importing errors from each layer. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A transport-level error (unreachable server, timeout, bad body).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed envelope or record).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (sign-out failed, nobody signed in).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A collection-level error (validation, server rejection, ...).
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Classifies the error for the presentation.
    ///
    /// Collection errors keep their own kind. Bare transport and protocol
    /// errors are network failures. Session and configuration errors have
    /// no collection kind and return `None`.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Collection(e) => Some(e.kind()),
            Self::Transport(_) | Self::Protocol(_) => Some(ErrorKind::Network),
            Self::Session(_) | Self::InvalidConfig(_) => None,
        }
    }
}
