//! Session types: the derived authentication state and what it gates.
//!
//! A "session" here is not stored anywhere; it is derived from the last
//! notification the identity provider sent. It decides:
//! - WHICH top-level screen is shown ([`Screen`])
//! - WHETHER per-user state like the character collection exists at all
//!   ([`SessionScope`])

use tokio::sync::watch;

use crate::Identity;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authentication state of the client.
///
/// ```text
///                  first notification
///   Initializing ─────────┬───────────→ Authenticated(identity)
///                         │                  │      ↑
///                         │          sign-out│      │sign-in
///                         │                  ↓      │
///                         └───────────→ Unauthenticated
/// ```
///
/// - **Initializing**: the provider hasn't reported yet. Nothing is
///   rendered, not even an empty or error state.
/// - **Authenticated**: someone is signed in.
/// - **Unauthenticated**: nobody is signed in.
///
/// Nothing moves the session back to `Initializing`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// Waiting for the identity provider's first notification.
    #[default]
    Initializing,

    /// A user is signed in.
    Authenticated(Identity),

    /// Nobody is signed in.
    Unauthenticated,
}

impl Session {
    /// Maps a provider notification to the session it implies.
    pub fn from_identity(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => Self::Authenticated(identity),
            None => Self::Unauthenticated,
        }
    }

    /// Returns the signed-in identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_initializing(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The top-level screen for this session, or `None` while
    /// initializing (render nothing).
    pub fn screen(&self) -> Option<Screen> {
        match self {
            Self::Initializing => None,
            Self::Authenticated(_) => Some(Screen::Home),
            Self::Unauthenticated => Some(Screen::Login),
        }
    }
}

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

/// The top-level screens the session gates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Sign-in form. Entry point of the unauthenticated stack.
    Login,

    /// Account creation form, reached from [`Screen::Login`]. Shares the
    /// unauthenticated stack.
    Register,

    /// The character list. Only reachable while authenticated.
    Home,
}

impl Screen {
    /// Returns `true` if the screen may be shown for `session`.
    pub fn is_allowed(self, session: &Session) -> bool {
        match (self, session) {
            (_, Session::Initializing) => false,
            (Self::Home, Session::Authenticated(_)) => true,
            (Self::Login | Self::Register, Session::Unauthenticated) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionScope
// ---------------------------------------------------------------------------

/// Ties per-user state to the session it was created for.
///
/// Obtained from [`SessionController::scope`](crate::SessionController::scope)
/// while authenticated. It stays current until that session changes in any
/// way: a sign-out, another identity replacing it, or the session
/// controller being torn down. Signing back in as the same identity starts
/// a new session and does not revive an old scope.
///
/// Anything holding a scope checks [`is_current`](Self::is_current) before
/// applying a late result.
#[derive(Debug, Clone)]
pub struct SessionScope {
    identity: Identity,

    /// Marked seen at the session this scope belongs to. Any later change
    /// shows up as `has_changed`.
    receiver: watch::Receiver<Session>,
}

impl SessionScope {
    /// `receiver` must already have seen the session authenticated as
    /// `identity`.
    pub(crate) fn new(identity: Identity, receiver: watch::Receiver<Session>) -> Self {
        Self { identity, receiver }
    }

    /// The identity this scope belongs to.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns `true` while the session this scope was created in is still
    /// the current one.
    pub fn is_current(&self) -> bool {
        // Only real changes reach the channel, and from an authenticated
        // session every change ends it. An error means the controller (the
        // sender) is gone.
        match self.receiver.has_changed() {
            Ok(false) => matches!(
                &*self.receiver.borrow(),
                Session::Authenticated(identity) if *identity == self.identity
            ),
            Ok(true) | Err(_) => false,
        }
    }

    /// Waits until the scope is no longer current.
    pub async fn ended(&self) {
        let mut receiver = self.receiver.clone();
        // Resolves straight away if the session already moved on, and
        // errors once the controller is gone. Either way the scope is over.
        let _ = receiver.changed().await;
    }
}
