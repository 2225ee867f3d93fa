//! `Client`: the session and collection layers wired together.
//!
//! This is the entry point for a presentation. It ties together all the
//! layers: identity provider → session → collection → remote store.
//!
//! The client keeps one invariant: a collection is mounted exactly while
//! the session is authenticated, and it belongs to the identity that is
//! signed in. A sign-out unmounts it. An account switch replaces it with
//! a fresh one for the new user.

use std::sync::Arc;

use spiderverse_collection::{
    CharacterCollectionController, CollectionError, EditSessionController, Reconcile,
};
use spiderverse_protocol::CharacterId;
use spiderverse_session::{
    AuthGateway, Identity, Screen, Session, SessionController, SessionError, SessionScope,
};
use spiderverse_transport::{HttpRemoteStore, RemoteStore};
use tokio::sync::watch;

use crate::{ClientConfig, ClientError};

/// Drives the client state machine for one presentation.
///
/// ## Lifecycle
///
/// ```text
///                       ┌────────── sync() ──────────┐
///                       │                            ↓
/// new() ──→ [Initializing] ──→ [Unauthenticated]  [Authenticated]
///           nothing mounted    nothing mounted    collection mounted + loaded
///                                     ↑                  │
///                                     └──── sign_out() ──┘
/// ```
///
/// The session moves on its own as the identity provider reports changes.
/// The presentation calls [`sync`](Self::sync) (or awaits
/// [`next_change`](Self::next_change)) to bring the mounted collection in
/// line with it.
pub struct Client<A: AuthGateway, R: RemoteStore> {
    session: SessionController<A>,
    store: Arc<R>,

    /// Marks which session changes `sync` has already handled.
    changes: watch::Receiver<Session>,

    /// Present only while authenticated.
    collection: Option<CharacterCollectionController<R>>,

    form: EditSessionController,
}

impl<A: AuthGateway> Client<A, HttpRemoteStore> {
    /// Creates a client that talks to the characters API over HTTP.
    ///
    /// # Errors
    /// [`ClientError::Transport`] if the configured base URL is invalid.
    pub fn connect(gateway: Arc<A>, config: ClientConfig) -> Result<Self, ClientError> {
        let store = HttpRemoteStore::new(config.store)?;
        tracing::info!(base_url = store.base_url(), "client configured");
        Ok(Self::new(gateway, Arc::new(store)))
    }
}

impl<A: AuthGateway, R: RemoteStore> Client<A, R> {
    /// Creates a client over any remote store.
    ///
    /// Nothing is mounted until the first [`sync`](Self::sync).
    pub fn new(gateway: Arc<A>, store: Arc<R>) -> Self {
        let session = SessionController::new(gateway);
        let changes = session.watch();
        Self {
            session,
            store,
            changes,
            collection: None,
            form: EditSessionController::new(),
        }
    }

    // -- Session ------------------------------------------------------------

    /// Returns the current session.
    pub fn session(&self) -> Session {
        self.session.current()
    }

    /// Returns the signed-in identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    /// The top-level screen to show, or `None` while initializing.
    pub fn screen(&self) -> Option<Screen> {
        self.session.screen()
    }

    /// Returns a receiver for session changes.
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.session.watch()
    }

    /// Waits for the provider's first notification, then syncs.
    ///
    /// # Errors
    /// Whatever the initial load reports if a user is already signed in.
    pub async fn resolved(&mut self) -> Result<Session, ClientError> {
        let session = self.session.resolved().await;
        self.sync().await?;
        Ok(session)
    }

    /// Waits for the next session change, then syncs.
    ///
    /// Returns immediately if a change arrived since the last sync.
    ///
    /// # Errors
    /// Whatever the load reports if the change mounted a collection.
    pub async fn next_change(&mut self) -> Result<Session, ClientError> {
        // Only fails once the session controller is gone, and it lives as
        // long as `self`.
        let _ = self.changes.changed().await;
        self.sync().await?;
        Ok(self.session.current())
    }

    /// Mounts, replaces, or unmounts the collection to match the session.
    ///
    /// A newly mounted collection is loaded straight away. If that load
    /// fails the collection stays mounted (empty, loaded) and the error is
    /// returned so the presentation can show it.
    ///
    /// # Errors
    /// The load error of a newly mounted collection.
    pub async fn sync(&mut self) -> Result<(), ClientError> {
        self.changes.mark_unchanged();

        match self.session.scope() {
            Some(scope) => {
                let mounted = self
                    .collection
                    .as_ref()
                    .is_some_and(|collection| collection.scope().is_current());
                if mounted {
                    return Ok(());
                }
                self.mount(scope).await
            }
            None => {
                self.unmount();
                Ok(())
            }
        }
    }

    /// Signs the current user out and unmounts their collection.
    ///
    /// # Errors
    /// [`SessionError::NotSignedIn`] if nobody is signed in, or the
    /// provider's sign-out failure.
    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.session.sign_out().await?;
        self.sync().await
    }

    // -- Home screen --------------------------------------------------------

    /// The signed-in user's collection, if one is mounted.
    pub fn collection(&self) -> Option<&CharacterCollectionController<R>> {
        self.collection.as_ref()
    }

    /// Mutable access to the mounted collection, for load and delete.
    pub fn collection_mut(&mut self) -> Option<&mut CharacterCollectionController<R>> {
        self.collection.as_mut()
    }

    /// The create/edit form.
    pub fn form(&self) -> &EditSessionController {
        &self.form
    }

    /// Mutable access to the form, for opening it and editing fields.
    pub fn form_mut(&mut self) -> &mut EditSessionController {
        &mut self.form
    }

    /// Opens the form on the character with `id`.
    ///
    /// # Errors
    /// - [`SessionError::NotSignedIn`] if no collection is mounted
    /// - [`CollectionError::UnknownCharacter`] if `id` isn't in the
    ///   collection
    pub fn edit(&mut self, id: &CharacterId) -> Result<(), ClientError> {
        let collection = self.collection.as_ref().ok_or(SessionError::NotSignedIn)?;
        let character = collection
            .get(id)
            .ok_or_else(|| CollectionError::UnknownCharacter(id.clone()))?;
        self.form.open_existing(character);
        Ok(())
    }

    /// Commits the form through the mounted collection.
    ///
    /// # Errors
    /// [`SessionError::NotSignedIn`] if no collection is mounted, otherwise
    /// whatever the commit reports. The form stays open on failure.
    pub async fn submit_form(&mut self) -> Result<Reconcile, ClientError> {
        let collection = self.collection.as_mut().ok_or(SessionError::NotSignedIn)?;
        Ok(self.form.commit(collection).await?)
    }

    /// Unmounts everything and unsubscribes from the identity provider.
    pub fn teardown(mut self) {
        self.unmount();
        self.session.teardown();
    }

    // -- Internals ----------------------------------------------------------

    async fn mount(&mut self, scope: SessionScope) -> Result<(), ClientError> {
        self.unmount();
        tracing::info!(user = %scope.identity(), "mounting collection");

        let collection = self
            .collection
            .insert(CharacterCollectionController::new(Arc::clone(&self.store), scope));
        match collection.load().await {
            Err(CollectionError::Detached) => {
                // The session moved on during the first load. The next sync
                // mounts whatever replaced it.
                self.unmount();
                Err(CollectionError::Detached.into())
            }
            result => Ok(result?),
        }
    }

    fn unmount(&mut self) {
        if let Some(collection) = self.collection.take() {
            tracing::info!(user = %collection.scope().identity(), "collection unmounted");
        }
        self.form.cancel();
    }
}
