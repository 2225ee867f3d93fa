//! The edit session controller: the create/edit form nested inside the
//! collection screen.

use spiderverse_protocol::{Character, Field};
use spiderverse_transport::RemoteStore;

use crate::{CharacterCollectionController, CollectionError, Draft, EditState, Reconcile};

/// Holds at most one [`Draft`] and commits it through the collection.
///
/// The draft never touches the collection directly. On commit it is sent
/// as a create or update, and the collection only changes by reloading
/// from the server afterwards.
#[derive(Debug, Default)]
pub struct EditSessionController {
    draft: Option<Draft>,
}

impl EditSessionController {
    /// Creates a controller with the form closed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the form is in its lifecycle.
    pub fn state(&self) -> EditState {
        EditState::of(self.draft.as_ref())
    }

    /// The open draft, if any.
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Returns `true` if the open draft edits an existing character, so
    /// the form is titled "edit" rather than "new".
    pub fn is_editing(&self) -> bool {
        self.draft.as_ref().is_some_and(|draft| !draft.is_new())
    }

    /// Opens the form on an empty draft.
    ///
    /// Any draft already open is discarded.
    pub fn open_new(&mut self) {
        self.replace(Draft::new());
    }

    /// Opens the form on a copy of `character`.
    ///
    /// Any draft already open is discarded.
    pub fn open_existing(&mut self, character: &Character) {
        self.replace(Draft::from_character(character));
    }

    /// Changes one field of the open draft.
    ///
    /// # Errors
    /// [`CollectionError::NoDraft`] if the form is closed.
    pub fn set_field(
        &mut self,
        field: Field,
        value: impl Into<String>,
    ) -> Result<(), CollectionError> {
        let draft = self.draft.as_mut().ok_or(CollectionError::NoDraft)?;
        draft.set_field(field, value);
        Ok(())
    }

    /// Closes the form and returns the discarded draft.
    pub fn cancel(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// Sends the draft as a create or update.
    ///
    /// On success the form closes. On failure the draft stays open, with
    /// the user's edits intact, so they can fix it and try again.
    ///
    /// # Errors
    /// [`CollectionError::NoDraft`] if the form is closed, otherwise
    /// whatever the collection operation reports.
    pub async fn commit<R: RemoteStore>(
        &mut self,
        collection: &mut CharacterCollectionController<R>,
    ) -> Result<Reconcile, CollectionError> {
        let draft = self.draft.as_ref().ok_or(CollectionError::NoDraft)?;

        let outcome = match draft.target() {
            None => collection.create(draft.fields()).await?,
            Some(id) => collection.update(id, draft.fields()).await?,
        };

        self.draft = None;
        Ok(outcome)
    }

    fn replace(&mut self, draft: Draft) {
        if let Some(previous) = self.draft.replace(draft) {
            tracing::debug!(
                target_id = ?previous.target(),
                name = %previous.get(Field::Name),
                "discarding open draft"
            );
        }
    }
}
