//! The session controller: turns identity provider notifications into the
//! client's authentication state.
//!
//! This is the top of the client's state machine. It's responsible for:
//! - Subscribing to the [`AuthGateway`] for exactly as long as it lives
//! - Deriving the current [`Session`] from each notification
//! - Telling the presentation which [`Screen`] to show
//! - Handing out [`SessionScope`]s so per-user state can tell when the
//!   user it was loaded for is gone
//!
//! # Concurrency note
//!
//! The provider may call back from any thread and at any time, including
//! while a request issued by the collection is still pending. The state
//! lives in a `tokio::sync::watch` channel: the callback replaces the
//! value synchronously, the latest notification always wins, and readers
//! never see two sessions at once.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    AuthGateway, Identity, Screen, Session, SessionError, SessionScope,
    Subscription,
};

/// Tracks who is signed in and gates the top-level screen.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ [Initializing] ──(first notification)──→ [Authenticated]
///                                   │                   ↑       │
///                                   │          sign-in  │       │ sign_out()
///                                   ↓                   │       ↓
///                            [Unauthenticated] ─────────┘  [Unauthenticated]
///
/// drop / teardown() ──→ unsubscribed, every SessionScope ends
/// ```
pub struct SessionController<A: AuthGateway> {
    gateway: Arc<A>,

    /// Kept so `watch()` and `scope()` can hand out receivers. The sender
    /// is owned by the gateway listener.
    receiver: watch::Receiver<Session>,

    /// The live gateway registration. Dropping it unsubscribes, which
    /// drops the listener and with it the only sender.
    _subscription: Subscription,
}

impl<A: AuthGateway> SessionController<A> {
    /// Creates a controller and subscribes it to `gateway`.
    ///
    /// The session starts as [`Session::Initializing`]. If the gateway has
    /// already resolved, its replay moves the session on before this
    /// returns.
    pub fn new(gateway: Arc<A>) -> Self {
        let (sender, receiver) = watch::channel(Session::Initializing);

        let subscription = gateway.subscribe(Arc::new(move |identity| {
            apply_notification(&sender, identity);
        }));

        Self {
            gateway,
            receiver,
            _subscription: subscription,
        }
    }

    /// Returns the current session.
    pub fn current(&self) -> Session {
        self.receiver.borrow().clone()
    }

    /// Returns the signed-in identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.receiver.borrow().identity().cloned()
    }

    /// The top-level screen to show, or `None` while initializing.
    pub fn screen(&self) -> Option<Screen> {
        self.receiver.borrow().screen()
    }

    /// Returns a receiver the presentation can await session changes on.
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.receiver.clone()
    }

    /// Returns a scope bound to the current authenticated session, or
    /// `None` when nobody is signed in.
    pub fn scope(&self) -> Option<SessionScope> {
        let mut receiver = self.receiver.clone();
        let identity = receiver.borrow_and_update().identity().cloned()?;
        Some(SessionScope::new(identity, receiver))
    }

    /// Waits for the provider's first notification and returns the
    /// resulting session.
    pub async fn resolved(&self) -> Session {
        let mut receiver = self.receiver.clone();
        match receiver.wait_for(|session| !session.is_initializing()).await {
            Ok(session) => session.clone(),
            // The sender only goes away with the subscription, which
            // lives as long as `self`.
            Err(_) => self.current(),
        }
    }

    /// Signs the current user out through the gateway.
    ///
    /// The session itself changes when the gateway's notification arrives,
    /// not here.
    ///
    /// # Errors
    /// - [`SessionError::NotSignedIn`] if nobody is signed in
    /// - whatever the gateway reports if sign-out fails
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let Some(identity) = self.identity() else {
            return Err(SessionError::NotSignedIn);
        };

        match self.gateway.sign_out().await {
            Ok(()) => {
                tracing::info!(%identity, "signed out");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%identity, error = %e, "sign-out failed");
                Err(e)
            }
        }
    }

    /// Unsubscribes from the gateway and drops the controller.
    ///
    /// Equivalent to dropping it; spelled out for call sites where the
    /// teardown is the point.
    pub fn teardown(self) {
        tracing::debug!("session controller torn down");
        drop(self);
    }
}

/// Applies one provider notification to the session state.
fn apply_notification(sender: &watch::Sender<Session>, identity: Option<Identity>) {
    let next = Session::from_identity(identity);
    sender.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        match &next {
            Session::Authenticated(identity) => {
                tracing::info!(%identity, from = ?current, "session authenticated");
            }
            _ => tracing::info!(from = ?current, "session unauthenticated"),
        }
        *current = next;
        true
    });
}

// =========================================================================
// Tests
// =========================================================================
