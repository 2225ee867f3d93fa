//! An in-process identity provider.
//!
//! [`LocalAuthGateway`] keeps the signed-in identity in memory and mints
//! random uids for new sign-ins. It is what the console demo uses when no
//! real provider is configured, and what the tests drive to simulate
//! sign-in, sign-out and external invalidation at exact moments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use rand::distr::Alphanumeric;

use crate::{AuthGateway, AuthListener, Identity, SessionError, Subscription};

/// Length of minted uids. Matches the 28-character uids hosted
/// identity providers hand out.
const UID_LEN: usize = 28;

#[derive(Default)]
struct Inner {
    /// `false` until the provider has decided whether someone is signed
    /// in. Subscribers registered before that get no immediate callback.
    resolved: bool,
    current: Option<Identity>,
    listeners: HashMap<u64, AuthListener>,
    next_listener_id: u64,
}

/// An [`AuthGateway`] that lives entirely in memory.
///
/// Cloning is cheap and every clone shares the same state, so one clone
/// can be handed to a session controller while another drives it.
#[derive(Clone, Default)]
pub struct LocalAuthGateway {
    inner: Arc<Mutex<Inner>>,
}

impl LocalAuthGateway {
    /// Creates a gateway that hasn't resolved yet: subscribers wait for
    /// the first [`resolve`](Self::resolve) or sign-in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that is already resolved to `current`.
    pub fn resolved(current: Option<Identity>) -> Self {
        let gateway = Self::new();
        {
            let mut inner = gateway.lock();
            inner.resolved = true;
            inner.current = current;
        }
        gateway
    }

    /// Finishes startup: reports whether a persisted login was found.
    pub fn resolve(&self, current: Option<Identity>) {
        self.publish(current);
    }

    /// Signs in a new user with a freshly minted uid.
    pub fn sign_in(&self, email: impl Into<String>) -> Identity {
        let identity = Identity::new(generate_uid()).with_email(email);
        self.publish(Some(identity.clone()));
        identity
    }

    /// Signs in a specific identity.
    pub fn sign_in_as(&self, identity: Identity) {
        self.publish(Some(identity));
    }

    /// Ends the session from the provider's side, as when a token is
    /// revoked on another device.
    pub fn invalidate(&self) {
        tracing::info!("local auth session invalidated");
        self.publish(None);
    }

    /// Returns the current identity.
    pub fn current(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores the new state and notifies every listener.
    ///
    /// Listeners run after the lock is released so they may call back
    /// into the gateway.
    fn publish(&self, current: Option<Identity>) {
        let listeners: Vec<AuthListener> = {
            let mut inner = self.lock();
            inner.resolved = true;
            inner.current = current.clone();
            inner.listeners.values().cloned().collect()
        };

        for listener in listeners {
            listener(current.clone());
        }
    }
}

impl AuthGateway for LocalAuthGateway {
    fn subscribe(&self, listener: AuthListener) -> Subscription {
        let (id, replay) = {
            let mut inner = self.lock();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.insert(id, Arc::clone(&listener));
            let replay = inner.resolved.then(|| inner.current.clone());
            (id, replay)
        };

        tracing::debug!(listener = id, "auth listener registered");

        if let Some(current) = replay {
            listener(current);
        }

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&id);
            tracing::debug!(listener = id, "auth listener removed");
        })
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.publish(None);
        Ok(())
    }
}

/// Generates a random alphanumeric uid.
fn generate_uid() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(UID_LEN)
        .map(char::from)
        .collect()
}
