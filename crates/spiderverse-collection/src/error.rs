//! Error types for the collection layer.
//!
//! Every failure the collection and edit controllers can hit is surfaced
//! as a [`CollectionError`]; none is swallowed. The controllers never pick
//! user-facing text: the presentation matches on [`CollectionError::kind`]
//! and words the message itself.

use spiderverse_protocol::{CharacterId, ProtocolError};
use spiderverse_transport::TransportError;

/// A local precondition that failed before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The name is empty or only whitespace.
    #[error("name is required")]
    MissingName,
}

/// Errors that can occur during collection and edit operations.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// A local check failed; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not complete.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// A response arrived but isn't a well-formed envelope.
    #[error("unexpected response: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server answered and declined the operation.
    #[error("server rejected the operation: {}", .message.as_deref().unwrap_or("no reason given"))]
    ServerRejected {
        /// The server's explanation, if it sent one.
        message: Option<String>,
    },

    /// The id is not in the collection, so there is nothing to confirm.
    #[error("character {0} is not in the collection")]
    UnknownCharacter(CharacterId),

    /// The edit form is closed, so there is no draft to change or commit.
    #[error("no draft is open")]
    NoDraft,

    /// The session the collection was mounted for ended while the
    /// operation was in flight. The late response was ignored.
    #[error("session ended before the operation completed")]
    Detached,
}

/// Coarse classification of a [`CollectionError`], for choosing what to
/// tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Fix the input and try again.
    Validation,
    /// The request didn't complete or the response was unreadable.
    Network,
    /// The server said no.
    ServerRejected,
    /// A programming or UI-state error: unknown id, closed form.
    InvalidState,
    /// The owning screen is gone; nothing to show.
    Detached,
}

impl CollectionError {
    /// Returns the error's classification.
    ///
    /// Transport and parse failures both count as [`ErrorKind::Network`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(_) | Self::Protocol(_) => ErrorKind::Network,
            Self::ServerRejected { .. } => ErrorKind::ServerRejected,
            Self::UnknownCharacter(_) | Self::NoDraft => ErrorKind::InvalidState,
            Self::Detached => ErrorKind::Detached,
        }
    }
}
