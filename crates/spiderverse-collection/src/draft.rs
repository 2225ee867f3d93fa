//! The edit form's draft and state machine types.

use spiderverse_protocol::{Character, CharacterFields, CharacterId, Field};

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// The unsaved contents of the create/edit form.
///
/// A draft is a value, not a view: opening it from a [`Character`] copies
/// the character's fields, so nothing that happens to the collection
/// afterwards reaches it, and nothing typed into it reaches the
/// collection until the server has accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    fields: CharacterFields,

    /// The character being edited. `None` means "creating new".
    target: Option<CharacterId>,
}

impl Draft {
    /// An empty draft for a new character.
    pub fn new() -> Self {
        Self::default()
    }

    /// A draft pre-filled with a snapshot of `character`.
    pub fn from_character(character: &Character) -> Self {
        Self {
            fields: character.fields(),
            target: Some(character.id.clone()),
        }
    }

    /// The current field values.
    pub fn fields(&self) -> &CharacterFields {
        &self.fields
    }

    /// Reads one field.
    pub fn get(&self, field: Field) -> &str {
        self.fields.get(field)
    }

    /// Replaces one field.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.fields.set(field, value);
    }

    /// The id of the character being edited, or `None` for a new one.
    pub fn target(&self) -> Option<&CharacterId> {
        self.target.as_ref()
    }

    /// Returns `true` if committing creates a new character.
    pub fn is_new(&self) -> bool {
        self.target.is_none()
    }
}

// ---------------------------------------------------------------------------
// EditState
// ---------------------------------------------------------------------------

/// Where the edit form is in its lifecycle.
///
/// ```text
///            open_new()                    cancel() / commit() ok
///   Closed ─────────────→ Creating ──────────────────────────────→ Closed
///     │                                                              ↑
///     └──────────────→ Editing(id) ──────────────────────────────────┘
///     open_existing()
/// ```
///
/// A failed commit leaves the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    /// No form is open.
    #[default]
    Closed,

    /// The form is open on a new, empty character.
    Creating,

    /// The form is open on a copy of an existing character.
    Editing(CharacterId),
}

impl EditState {
    /// Derives the state from the open draft, if any.
    pub(crate) fn of(draft: Option<&Draft>) -> Self {
        match draft {
            None => Self::Closed,
            Some(draft) => match draft.target() {
                None => Self::Creating,
                Some(id) => Self::Editing(id.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spider_man() -> Character {
        Character {
            id: CharacterId::new("1"),
            name: "Peter Parker".into(),
            alias: "Spider-Man".into(),
            description: "Bitten by a radioactive spider".into(),
            powers: "Wall-crawling".into(),
        }
    }

    #[test]
    fn test_new_draft_is_empty_and_new() {
        let draft = Draft::new();
        assert!(draft.is_new());
        assert_eq!(draft.fields(), &CharacterFields::default());
    }

    #[test]
    fn test_from_character_copies_every_field() {
        let draft = Draft::from_character(&spider_man());

        assert_eq!(draft.target(), Some(&CharacterId::new("1")));
        assert_eq!(draft.get(Field::Name), "Peter Parker");
        assert_eq!(draft.get(Field::Alias), "Spider-Man");
        assert_eq!(draft.get(Field::Description), "Bitten by a radioactive spider");
        assert_eq!(draft.get(Field::Powers), "Wall-crawling");
    }

    #[test]
    fn test_from_character_is_a_snapshot() {
        let mut character = spider_man();
        let mut draft = Draft::from_character(&character);

        character.alias = "Ben Reilly".into();
        draft.set_field(Field::Powers, "Organic webs");

        assert_eq!(draft.get(Field::Alias), "Spider-Man");
        assert_eq!(character.powers, "Wall-crawling");
    }

    #[test]
    fn test_edit_state_of_draft() {
        assert_eq!(EditState::of(None), EditState::Closed);
        assert_eq!(EditState::of(Some(&Draft::new())), EditState::Creating);
        assert_eq!(
            EditState::of(Some(&Draft::from_character(&spider_man()))),
            EditState::Editing(CharacterId::new("1"))
        );
    }
}
