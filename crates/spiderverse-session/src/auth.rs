//! The identity provider contract.
//!
//! The client doesn't implement authentication itself; login and
//! registration belong to an identity provider (Firebase, Auth0, a custom
//! backend). The session layer only needs two things from it:
//!
//! 1. a way to hear about "who is signed in" changes ([`AuthGateway::subscribe`])
//! 2. a way to sign the current user out ([`AuthGateway::sign_out`])
//!
//! Everything else about the provider stays behind this trait.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::SessionError;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// The provider's stable user id.
    pub uid: String,

    /// The user's email, if the provider knows it. The home screen shows
    /// it in its header.
    pub email: Option<String>,
}

impl Identity {
    /// Creates an identity with a uid and no email.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }

    /// Sets the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uid)
    }
}

/// Callback invoked with the new identity (or `None` after sign-out)
/// every time the provider's state changes.
pub type AuthListener = Arc<dyn Fn(Option<Identity>) + Send + Sync + 'static>;

/// Handle to an active [`AuthGateway::subscribe`] registration.
///
/// The subscription ends when the handle is dropped or when
/// [`unsubscribe`](Self::unsubscribe) is called, whichever comes first.
/// Holding the handle in the subscriber ties the registration to the
/// subscriber's own lifetime.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    /// Wraps the provider-specific cancel action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Ends the subscription now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// An identity provider.
///
/// # Contract
///
/// - `subscribe` registers a listener. Once the provider knows whether
///   someone is signed in (restoring a persisted login can take a
///   moment), the listener is called with the current identity, and
///   again on every later change. A subscriber registering after that
///   point gets the current identity right away.
/// - `sign_out` ends the current user's session. Listeners hear about it
///   through the normal change notification.
///
/// # Example
///
/// ```rust
/// use spiderverse_session::{AuthGateway, AuthListener, SessionError, Subscription};
///
/// /// A provider where nobody is ever signed in.
/// struct Anonymous;
///
/// impl AuthGateway for Anonymous {
///     fn subscribe(&self, listener: AuthListener) -> Subscription {
///         listener(None);
///         Subscription::new(|| {})
///     }
///
///     async fn sign_out(&self) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait AuthGateway: Send + Sync + 'static {
    /// Registers `listener` for identity changes.
    fn subscribe(&self, listener: AuthListener) -> Subscription;

    /// Signs the current user out.
    ///
    /// # Errors
    /// Returns [`SessionError::SignOutFailed`] if the provider refused.
    fn sign_out(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}
