//! Error types for the session layer.

/// Errors that can occur while managing the authentication session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity provider failed to sign the user out.
    #[error("sign-out failed: {0}")]
    SignOutFailed(String),

    /// Sign-out was requested while nobody is signed in.
    #[error("no user is signed in")]
    NotSignedIn,
}
