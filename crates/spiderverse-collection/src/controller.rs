//! The character collection controller: owns the signed-in user's
//! characters and keeps them in step with the server.
//!
//! Every mutation follows the same shape:
//!
//! ```text
//! validate ──→ send ──→ check scope ──→ check envelope ──→ reconcile
//!    │           │           │                │                │
//!    ↓           ↓           ↓                ↓                ↓
//! Validation  Network     Detached      ServerRejected   Synced | Stale
//! ```
//!
//! The collection is never patched locally. After a mutation succeeds it
//! is replaced wholesale by a fresh `GET /characters`, so it only ever
//! holds what the server last returned. A failed call leaves it exactly as
//! it was.

use std::sync::Arc;

use spiderverse_protocol::{
    character_path, encode_fields, ApiResponse, Character, CharacterFields,
    CharacterId, CHARACTERS_PATH,
};
use spiderverse_session::SessionScope;
use spiderverse_transport::{RemoteStore, RequestOptions};
use tokio::sync::watch;

use crate::{CollectionError, ValidationError};

// ---------------------------------------------------------------------------
// Operation status
// ---------------------------------------------------------------------------

/// The kind of call currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Load,
    Create,
    Update,
    Delete,
}

/// How the collection looks after a successful mutation.
#[must_use]
#[derive(Debug)]
pub enum Reconcile {
    /// The reload succeeded; the collection matches the server.
    Synced,

    /// The server applied the mutation but the reload failed. The
    /// collection still holds the list from before the mutation.
    Stale(Box<CollectionError>),
}

impl Reconcile {
    /// Returns `true` if the collection matches the server.
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

/// Proof that the user was asked before a delete.
///
/// Only [`CharacterCollectionController::confirm_delete`] creates one, and
/// [`CharacterCollectionController::delete`] takes one by value, so a
/// delete cannot be issued without going through the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    id: CharacterId,
    name: String,
}

impl DeleteConfirmation {
    /// The character that will be deleted.
    pub fn id(&self) -> &CharacterId {
        &self.id
    }

    /// The character's name, for the confirmation prompt.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Marks an operation as pending for as long as it is alive.
///
/// Clearing on drop means a cancelled future also re-enables the UI.
struct PendingGuard {
    sender: Arc<watch::Sender<Option<Operation>>>,
}

impl PendingGuard {
    fn start(sender: &Arc<watch::Sender<Option<Operation>>>, operation: Operation) -> Self {
        sender.send_replace(Some(operation));
        Self {
            sender: Arc::clone(sender),
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.sender.send_replace(None);
    }
}

// ---------------------------------------------------------------------------
// CharacterCollectionController
// ---------------------------------------------------------------------------

/// Owns the character collection for one signed-in user.
///
/// Mounted by the client when a session becomes authenticated and dropped
/// when it ends. The [`SessionScope`] it is created with ties it to that
/// session: any response that arrives after the session ended is thrown
/// away and the call returns [`CollectionError::Detached`].
///
/// Every operation takes `&mut self`, so at most one runs at a time.
pub struct CharacterCollectionController<R: RemoteStore> {
    store: Arc<R>,
    scope: SessionScope,

    /// The list from the last successful fetch, in server order.
    characters: Vec<Character>,

    /// Whether a load has completed, successfully or not.
    loaded: bool,

    pending: Arc<watch::Sender<Option<Operation>>>,
}

impl<R: RemoteStore> CharacterCollectionController<R> {
    /// Creates an empty, not-yet-loaded collection bound to `scope`.
    pub fn new(store: Arc<R>, scope: SessionScope) -> Self {
        let (pending, _) = watch::channel(None);
        Self {
            store,
            scope,
            characters: Vec::new(),
            loaded: false,
            pending: Arc::new(pending),
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// The characters from the last successful fetch, in server order.
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Looks up a character by id.
    pub fn get(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == *id)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Returns `false` until the first load finishes, whatever its outcome.
    /// The presentation shows its loading indicator until then.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Reports the operation in flight, if any. While it is `Some`, submit
    /// and delete actions must be disabled.
    pub fn pending(&self) -> watch::Receiver<Option<Operation>> {
        self.pending.subscribe()
    }

    /// Returns `true` while an operation is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// The scope this collection was mounted with.
    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    // -- Operations ---------------------------------------------------------

    /// Fetches the full list and replaces the collection with it.
    ///
    /// # Errors
    /// On any failure the previous collection is kept. No retry.
    pub async fn load(&mut self) -> Result<(), CollectionError> {
        let _pending = self.begin(Operation::Load)?;

        let result = match self.fetch().await {
            Err(CollectionError::Detached) => return Err(CollectionError::Detached),
            result => result,
        };
        self.loaded = true;

        match result {
            Ok(characters) => {
                tracing::info!(count = characters.len(), "characters loaded");
                self.characters = characters;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "load failed");
                Err(e)
            }
        }
    }

    /// Creates a character from `fields`, then reloads.
    ///
    /// # Errors
    /// - [`ValidationError::MissingName`] for a blank name; nothing is sent
    /// - transport, protocol, or server failures; the collection is unchanged
    pub async fn create(
        &mut self,
        fields: &CharacterFields,
    ) -> Result<Reconcile, CollectionError> {
        validate(fields)?;
        let _pending = self.begin(Operation::Create)?;

        let body = encode_fields(fields)?;
        self.send(CHARACTERS_PATH, RequestOptions::post(body))
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "create failed"))?;
        tracing::info!(name = %fields.name, "character created");

        self.reconcile().await
    }

    /// Replaces the fields of character `id`, then reloads.
    ///
    /// # Errors
    /// Same as [`create`](Self::create).
    pub async fn update(
        &mut self,
        id: &CharacterId,
        fields: &CharacterFields,
    ) -> Result<Reconcile, CollectionError> {
        validate(fields)?;
        let _pending = self.begin(Operation::Update)?;

        let body = encode_fields(fields)?;
        self.send(&character_path(id), RequestOptions::put(body))
            .await
            .inspect_err(|e| tracing::warn!(%id, error = %e, "update failed"))?;
        tracing::info!(%id, "character updated");

        self.reconcile().await
    }

    /// Starts the delete flow for `id`.
    ///
    /// The returned confirmation names the character; the presentation asks
    /// the user and, on yes, passes it to [`delete`](Self::delete).
    ///
    /// # Errors
    /// [`CollectionError::UnknownCharacter`] if `id` isn't in the collection.
    pub fn confirm_delete(
        &self,
        id: &CharacterId,
    ) -> Result<DeleteConfirmation, CollectionError> {
        let character = self
            .get(id)
            .ok_or_else(|| CollectionError::UnknownCharacter(id.clone()))?;
        Ok(DeleteConfirmation {
            id: character.id.clone(),
            name: character.name.clone(),
        })
    }

    /// Deletes the confirmed character, then reloads.
    ///
    /// # Errors
    /// Transport, protocol, or server failures; the collection is unchanged.
    pub async fn delete(
        &mut self,
        confirmation: DeleteConfirmation,
    ) -> Result<Reconcile, CollectionError> {
        let _pending = self.begin(Operation::Delete)?;
        let id = confirmation.id;

        self.send(&character_path(&id), RequestOptions::delete())
            .await
            .inspect_err(|e| tracing::warn!(%id, error = %e, "delete failed"))?;
        tracing::info!(%id, "character deleted");

        self.reconcile().await
    }

    // -- Internals ----------------------------------------------------------

    /// Marks `operation` as pending, unless the session already ended.
    fn begin(&self, operation: Operation) -> Result<PendingGuard, CollectionError> {
        if !self.scope.is_current() {
            return Err(CollectionError::Detached);
        }
        tracing::debug!(?operation, user = %self.scope.identity(), "operation started");
        Ok(PendingGuard::start(&self.pending, operation))
    }

    /// The one post-mutation step: reload, and report whether it worked.
    ///
    /// A failed reload doesn't fail the mutation. The server already has
    /// the change, so the caller gets [`Reconcile::Stale`] and the old list
    /// stays in place.
    async fn reconcile(&mut self) -> Result<Reconcile, CollectionError> {
        match self.fetch().await {
            Ok(characters) => {
                self.characters = characters;
                self.loaded = true;
                Ok(Reconcile::Synced)
            }
            Err(CollectionError::Detached) => Err(CollectionError::Detached),
            Err(e) => {
                tracing::warn!(error = %e, "reload after mutation failed; list is stale");
                Ok(Reconcile::Stale(Box::new(e)))
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Character>, CollectionError> {
        let response = self.send(CHARACTERS_PATH, RequestOptions::get()).await?;
        Ok(response.into_characters()?)
    }

    /// Sends one request and unwraps the envelope.
    ///
    /// The scope is checked once the response is back: if the session
    /// ended in the meantime, the response is discarded unread.
    async fn send(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, CollectionError> {
        let method = options.method;
        let result = self.store.request(path, options).await;

        if !self.scope.is_current() {
            tracing::debug!(%method, path, "session ended while request was in flight; response dropped");
            return Err(CollectionError::Detached);
        }

        let response = ApiResponse::from_value(result?)?;
        if !response.success {
            return Err(CollectionError::ServerRejected {
                message: response.message,
            });
        }
        Ok(response)
    }
}

fn validate(fields: &CharacterFields) -> Result<(), ValidationError> {
    if fields.has_name() {
        Ok(())
    } else {
        Err(ValidationError::MissingName)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `CharacterCollectionController`, driven through the
    //! in-memory store so every request can be counted and every failure
    //! injected at a known point.

    use std::sync::Mutex;

    use serde_json::{json, Value};
    use spiderverse_session::{Identity, LocalAuthGateway, SessionController};
    use spiderverse_transport::{Fault, Method, MemoryRemoteStore, TransportError};

    use super::*;
    use crate::ErrorKind;

    // -- Helpers ----------------------------------------------------------

    /// A signed-in session plus a collection mounted on it. The session
    /// controller must outlive the collection's scope.
    struct Fixture<R: RemoteStore> {
        gateway: LocalAuthGateway,
        _session: SessionController<LocalAuthGateway>,
        collection: CharacterCollectionController<R>,
    }

    fn mount<R: RemoteStore>(store: Arc<R>) -> Fixture<R> {
        let gateway = LocalAuthGateway::resolved(Some(Identity::new("uid-peter")));
        let session = SessionController::new(Arc::new(gateway.clone()));
        let scope = session.scope().expect("signed in");
        Fixture {
            gateway,
            _session: session,
            collection: CharacterCollectionController::new(store, scope),
        }
    }

    fn seeded_store() -> Arc<MemoryRemoteStore> {
        let store = MemoryRemoteStore::new();
        store.insert(json!({"name": "Peter Parker", "alias": "Spider-Man"}));
        store.insert(json!({"name": "Gwen Stacy", "alias": "Spider-Woman"}));
        Arc::new(store)
    }

    fn names<R: RemoteStore>(collection: &CharacterCollectionController<R>) -> Vec<String> {
        collection.characters().iter().map(|c| c.name.clone()).collect()
    }

    /// Runs a hook when a request arrives, before answering it from the
    /// inner store.
    struct HookedStore {
        inner: MemoryRemoteStore,
        hook: Box<dyn Fn(&str, Method) + Send + Sync>,
    }

    impl RemoteStore for HookedStore {
        async fn request(
            &self,
            path: &str,
            options: RequestOptions,
        ) -> Result<Value, TransportError> {
            (self.hook)(path, options.method);
            self.inner.request(path, options).await
        }
    }

    // =====================================================================
    // load()
    // =====================================================================

    #[tokio::test]
    async fn test_load_single_character_defaults_missing_fields() {
        let store = Arc::new(MemoryRemoteStore::new());
        store.fail_next(Fault::Respond(json!({
            "success": true,
            "data": [{"id": "1", "name": "Peter Parker", "alias": "Spider-Man"}]
        })));
        let mut f = mount(store);

        f.collection.load().await.expect("load should succeed");

        assert_eq!(f.collection.len(), 1);
        let peter = &f.collection.characters()[0];
        assert_eq!(peter.id, CharacterId::new("1"));
        assert_eq!(peter.name, "Peter Parker");
        assert_eq!(peter.alias, "Spider-Man");
        assert_eq!(peter.description, "");
        assert_eq!(peter.powers, "");
    }

    #[tokio::test]
    async fn test_load_marks_loaded_and_keeps_server_order() {
        let mut f = mount(seeded_store());
        assert!(!f.collection.is_loaded());

        f.collection.load().await.unwrap();

        assert!(f.collection.is_loaded());
        assert_eq!(names(&f.collection), ["Peter Parker", "Gwen Stacy"]);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_collection() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let before = f.collection.characters().to_vec();

        store.fail_next(Fault::Network);
        let err = f.collection.load().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(f.collection.characters(), before.as_slice());
        assert_eq!(store.request_count(), 2, "no retry");
    }

    #[tokio::test]
    async fn test_load_first_failure_still_ends_loading() {
        let store = seeded_store();
        store.fail_next(Fault::Network);
        let mut f = mount(store);

        assert!(f.collection.load().await.is_err());

        assert!(f.collection.is_loaded());
        assert!(f.collection.is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_body_is_network_kind() {
        let store = seeded_store();
        store.fail_next(Fault::Respond(json!({"data": []})));
        let mut f = mount(store);

        let err = f.collection.load().await.unwrap_err();

        assert!(matches!(err, CollectionError::Protocol(_)));
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_load_server_declined_is_server_rejected() {
        let store = seeded_store();
        store.fail_next(Fault::Reject(Some("quota exceeded".into())));
        let mut f = mount(store);

        let err = f.collection.load().await.unwrap_err();

        assert!(matches!(
            err,
            CollectionError::ServerRejected { message: Some(ref m) } if m == "quota exceeded"
        ));
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[tokio::test]
    async fn test_create_blank_name_is_rejected_without_request() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let before = f.collection.characters().to_vec();
        let sent = store.request_count();

        for name in ["", "   ", "\t\n"] {
            let mut fields = CharacterFields::named(name);
            fields.alias = "x".into();

            let err = f.collection.create(&fields).await.unwrap_err();

            assert!(matches!(
                err,
                CollectionError::Validation(ValidationError::MissingName)
            ));
        }
        assert_eq!(store.request_count(), sent, "no request sent");
        assert_eq!(f.collection.characters(), before.as_slice());
    }

    #[tokio::test]
    async fn test_create_posts_then_replaces_with_server_list() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();

        let mut fields = CharacterFields::named("Miles Morales");
        fields.powers = "Venom blast".into();
        let outcome = f.collection.create(&fields).await.unwrap();

        assert!(outcome.is_synced());
        let requests = store.requests();
        let post = &requests[requests.len() - 2];
        assert_eq!(post.method, Method::Post);
        assert_eq!(post.path, "/characters");
        assert_eq!(post.body.as_ref().unwrap()["powers"], "Venom blast");
        assert_eq!(requests.last().unwrap().method, Method::Get);

        assert_eq!(
            names(&f.collection),
            ["Peter Parker", "Gwen Stacy", "Miles Morales"]
        );
        assert_eq!(
            f.collection.characters()[2].id,
            CharacterId::new("3"),
            "id comes from the server"
        );
    }

    #[tokio::test]
    async fn test_create_collection_matches_reload_not_local_patch() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();

        // The reload answers with a list that doesn't contain the new
        // character at all; that list is what the collection must hold.
        store.fail_next(Fault::Respond(json!({"success": true, "data": {"id": "9"}})));
        store.fail_next(Fault::Respond(json!({
            "success": true,
            "data": [{"id": "7", "name": "Jessica Drew"}]
        })));
        let outcome = f
            .collection
            .create(&CharacterFields::named("Miles Morales"))
            .await
            .unwrap();

        assert!(outcome.is_synced());
        assert_eq!(names(&f.collection), ["Jessica Drew"]);
    }

    #[tokio::test]
    async fn test_create_network_failure_leaves_collection_unchanged() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let before = f.collection.characters().to_vec();

        store.fail_next(Fault::Network);
        let err = f
            .collection
            .create(&CharacterFields::named("Miles Morales"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(f.collection.characters(), before.as_slice());
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_create_success_with_failed_reload_is_stale() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let before = f.collection.characters().to_vec();

        // First request (POST) goes through; the reload fails.
        store.fail_next(Fault::Respond(json!({"success": true})));
        store.fail_next(Fault::Network);
        let outcome = f
            .collection
            .create(&CharacterFields::named("Miles Morales"))
            .await
            .expect("mutation succeeded");

        match outcome {
            Reconcile::Stale(e) => assert_eq!(e.kind(), ErrorKind::Network),
            Reconcile::Synced => panic!("expected a stale reconcile"),
        }
        assert_eq!(f.collection.characters(), before.as_slice());
    }

    // =====================================================================
    // update()
    // =====================================================================

    #[tokio::test]
    async fn test_update_renames_and_old_name_is_gone() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let id = CharacterId::new("1");

        let outcome = f
            .collection
            .update(&id, &CharacterFields::named("Miles Morales"))
            .await
            .unwrap();

        assert!(outcome.is_synced());
        assert_eq!(f.collection.get(&id).unwrap().name, "Miles Morales");
        assert!(f.collection.characters().iter().all(|c| c.name != "Peter Parker"));
        let put = &store.requests()[1];
        assert_eq!(put.method, Method::Put);
        assert_eq!(put.path, "/characters/1");
    }

    #[tokio::test]
    async fn test_update_blank_name_is_rejected_without_request() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));

        let err = f
            .collection
            .update(&CharacterId::new("1"), &CharacterFields::named(" "))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_rejected_leaves_collection_unchanged() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let before = f.collection.characters().to_vec();

        let err = f
            .collection
            .update(&CharacterId::new("42"), &CharacterFields::named("Nobody"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServerRejected);
        assert_eq!(f.collection.characters(), before.as_slice());
    }

    #[tokio::test]
    async fn test_update_network_failure_leaves_collection_unchanged() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let before = f.collection.characters().to_vec();

        store.fail_next(Fault::Network);
        let err = f
            .collection
            .update(&CharacterId::new("1"), &CharacterFields::named("Ben Reilly"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(f.collection.characters(), before.as_slice());
        assert_eq!(store.request_count(), 2, "no reload after a failed update");
        assert!(!f.collection.is_pending());
    }

    // =====================================================================
    // delete()
    // =====================================================================

    #[tokio::test]
    async fn test_confirm_delete_names_the_character() {
        let mut f = mount(seeded_store());
        f.collection.load().await.unwrap();

        let confirmation = f.collection.confirm_delete(&CharacterId::new("2")).unwrap();

        assert_eq!(confirmation.id(), &CharacterId::new("2"));
        assert_eq!(confirmation.name(), "Gwen Stacy");
    }

    #[tokio::test]
    async fn test_confirm_delete_unknown_id_is_error() {
        let mut f = mount(seeded_store());
        f.collection.load().await.unwrap();

        let err = f
            .collection
            .confirm_delete(&CharacterId::new("99"))
            .unwrap_err();

        assert!(matches!(err, CollectionError::UnknownCharacter(ref id) if id.as_str() == "99"));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_delete_removes_after_reload() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();

        let confirmation = f.collection.confirm_delete(&CharacterId::new("1")).unwrap();
        let outcome = f.collection.delete(confirmation).await.unwrap();

        assert!(outcome.is_synced());
        assert_eq!(names(&f.collection), ["Gwen Stacy"]);
        let delete = &store.requests()[1];
        assert_eq!(delete.method, Method::Delete);
        assert_eq!(delete.path, "/characters/1");
    }

    #[tokio::test]
    async fn test_delete_server_rejected_keeps_character() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        let before = f.collection.characters().to_vec();

        store.fail_next(Fault::Reject(None));
        let confirmation = f.collection.confirm_delete(&CharacterId::new("1")).unwrap();
        let err = f.collection.delete(confirmation).await.unwrap_err();

        assert!(matches!(err, CollectionError::ServerRejected { message: None }));
        assert!(f.collection.get(&CharacterId::new("1")).is_some());
        assert_eq!(f.collection.characters(), before.as_slice());
    }

    // =====================================================================
    // Pending status
    // =====================================================================

    type StatusLog = Arc<Mutex<Vec<(Method, Option<Operation>)>>>;
    type PendingSlot = Arc<Mutex<Option<watch::Receiver<Option<Operation>>>>>;

    /// A store that records the collection's pending status each time a
    /// request arrives. Put the collection's receiver in the slot first.
    fn status_recording_store(inner: MemoryRemoteStore) -> (HookedStore, StatusLog, PendingSlot) {
        let seen = StatusLog::default();
        let pending_slot = PendingSlot::default();
        let log = Arc::clone(&seen);
        let slot = Arc::clone(&pending_slot);
        let store = HookedStore {
            inner,
            hook: Box::new(move |_, method| {
                let status = slot.lock().unwrap().as_ref().and_then(|rx| *rx.borrow());
                log.lock().unwrap().push((method, status));
            }),
        };
        (store, seen, pending_slot)
    }

    #[tokio::test]
    async fn test_pending_is_set_during_request_and_cleared_after() {
        let (store, seen, pending_slot) = status_recording_store(MemoryRemoteStore::new());
        let mut f = mount(Arc::new(store));
        *pending_slot.lock().unwrap() = Some(f.collection.pending());

        let outcome = f
            .collection
            .create(&CharacterFields::named("Miles Morales"))
            .await
            .unwrap();

        assert!(outcome.is_synced());
        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            [
                (Method::Post, Some(Operation::Create)),
                (Method::Get, Some(Operation::Create)),
            ],
            "the reload stays under the mutation's status"
        );
        assert!(!f.collection.is_pending());
        assert_eq!(*f.collection.pending().borrow(), None);
    }

    #[tokio::test]
    async fn test_pending_covers_update_and_its_reload() {
        let inner = MemoryRemoteStore::new();
        inner.insert(json!({"name": "Peter Parker"}));
        let (store, seen, pending_slot) = status_recording_store(inner);
        let mut f = mount(Arc::new(store));
        f.collection.load().await.unwrap();
        *pending_slot.lock().unwrap() = Some(f.collection.pending());
        seen.lock().unwrap().clear();

        let outcome = f
            .collection
            .update(&CharacterId::new("1"), &CharacterFields::named("Ben Reilly"))
            .await
            .unwrap();

        assert!(outcome.is_synced());
        assert_eq!(
            *seen.lock().unwrap(),
            [
                (Method::Put, Some(Operation::Update)),
                (Method::Get, Some(Operation::Update)),
            ]
        );
        assert!(!f.collection.is_pending());
    }

    #[tokio::test]
    async fn test_pending_covers_delete_and_its_reload() {
        let inner = MemoryRemoteStore::new();
        inner.insert(json!({"name": "Peter Parker"}));
        let (store, seen, pending_slot) = status_recording_store(inner);
        let mut f = mount(Arc::new(store));
        f.collection.load().await.unwrap();
        *pending_slot.lock().unwrap() = Some(f.collection.pending());
        seen.lock().unwrap().clear();

        let confirmation = f.collection.confirm_delete(&CharacterId::new("1")).unwrap();
        let outcome = f.collection.delete(confirmation).await.unwrap();

        assert!(outcome.is_synced());
        assert_eq!(
            *seen.lock().unwrap(),
            [
                (Method::Delete, Some(Operation::Delete)),
                (Method::Get, Some(Operation::Delete)),
            ]
        );
        assert!(!f.collection.is_pending());
    }

    #[tokio::test]
    async fn test_pending_cleared_after_failure() {
        let store = seeded_store();
        store.fail_next(Fault::Network);
        let mut f = mount(store);

        let _ = f.collection.load().await;

        assert!(!f.collection.is_pending());
    }

    // =====================================================================
    // Session ending mid-flight
    // =====================================================================

    #[tokio::test]
    async fn test_sign_out_during_request_returns_detached() {
        let gateway_slot: Arc<Mutex<Option<LocalAuthGateway>>> = Arc::default();
        let slot = Arc::clone(&gateway_slot);
        let inner = MemoryRemoteStore::new();
        inner.insert(json!({"name": "Peter Parker"}));
        let store = Arc::new(HookedStore {
            inner,
            hook: Box::new(move |_, method| {
                if method == Method::Delete {
                    if let Some(gateway) = slot.lock().unwrap().as_ref() {
                        gateway.invalidate();
                    }
                }
            }),
        });
        let mut f = mount(Arc::clone(&store));
        f.collection.load().await.unwrap();
        *gateway_slot.lock().unwrap() = Some(f.gateway.clone());
        let before = f.collection.characters().to_vec();

        let confirmation = f.collection.confirm_delete(&CharacterId::new("1")).unwrap();
        let err = f.collection.delete(confirmation).await.unwrap_err();

        assert!(matches!(err, CollectionError::Detached));
        assert_eq!(f.collection.characters(), before.as_slice());
        assert_eq!(
            store.inner.request_count(),
            2,
            "no reload once the session is gone"
        );
        assert!(!f.collection.is_pending());
    }

    #[tokio::test]
    async fn test_sign_out_and_back_in_during_request_returns_detached() {
        let gateway_slot: Arc<Mutex<Option<LocalAuthGateway>>> = Arc::default();
        let slot = Arc::clone(&gateway_slot);
        let inner = MemoryRemoteStore::new();
        inner.insert(json!({"name": "Peter Parker"}));
        let store = Arc::new(HookedStore {
            inner,
            hook: Box::new(move |_, method| {
                if method == Method::Get {
                    if let Some(gateway) = slot.lock().unwrap().as_ref() {
                        gateway.invalidate();
                        gateway.sign_in_as(Identity::new("uid-peter"));
                    }
                }
            }),
        });
        let mut f = mount(store);
        *gateway_slot.lock().unwrap() = Some(f.gateway.clone());

        let err = f.collection.load().await.unwrap_err();

        assert!(matches!(err, CollectionError::Detached));
        assert!(f.collection.is_empty(), "the old session's response is dropped");
        assert!(!f.collection.is_loaded());
        assert!(!f.collection.scope().is_current());
    }

    #[tokio::test]
    async fn test_operation_after_sign_out_is_detached_without_request() {
        let store = seeded_store();
        let mut f = mount(Arc::clone(&store));

        f.gateway.invalidate();
        let err = f.collection.load().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Detached);
        assert_eq!(store.request_count(), 0);
        assert!(!f.collection.is_loaded());
    }
}
