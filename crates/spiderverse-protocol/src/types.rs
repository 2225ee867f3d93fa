//! Core wire types for the characters API.
//!
//! Every type here mirrors a JSON shape the server sends or expects.
//! The server owns the records; the client only ever holds copies of
//! what the server acknowledged.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Path of the character collection (list with GET, create with POST).
pub const CHARACTERS_PATH: &str = "/characters";

/// Path of a single character (update with PUT, remove with DELETE).
///
/// The id is percent-encoded, so an id containing `/`, `?` or `#` still
/// names a single path segment.
pub fn character_path(id: &CharacterId) -> String {
    format!("{CHARACTERS_PATH}/{}", urlencoding::encode(id.as_str()))
}

// ---------------------------------------------------------------------------
// CharacterId
// ---------------------------------------------------------------------------

/// The server-assigned identifier of a character.
///
/// The id is opaque to the client: it is never generated locally and
/// never interpreted, only echoed back in request paths. The API has been
/// seen to send it both as a JSON string and as a JSON integer, so both
/// decode into the same textual form: `1` and `"1"` are the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
    /// Wraps a raw id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for CharacterId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// Decodes an optional text field where both a missing key and an explicit
/// `null` mean "empty".
fn nullable_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// A character record as acknowledged by the server.
///
/// Only `name` is required. The other text fields default to empty when
/// the server omits them or sends `null`. Unknown keys (timestamps, owner
/// ids) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub alias: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub powers: String,
}

impl Character {
    /// Copies the editable fields out of this record.
    ///
    /// The copy is independent: later changes to the collection never
    /// reach a form that was opened from it.
    pub fn fields(&self) -> CharacterFields {
        CharacterFields {
            name: self.name.clone(),
            alias: self.alias.clone(),
            description: self.description.clone(),
            powers: self.powers.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// CharacterFields
// ---------------------------------------------------------------------------

/// One of the four editable text fields of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Alias,
    Description,
    Powers,
}

/// The editable part of a character: the request body of both create
/// (`POST /characters`) and update (`PUT /characters/{id}`).
///
/// All four keys are always sent, empty strings included, so an update
/// can clear an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterFields {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub powers: String,
}

impl CharacterFields {
    /// Creates a field set with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if the name contains something other than whitespace.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Reads one field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Alias => &self.alias,
            Field::Description => &self.description,
            Field::Powers => &self.powers,
        }
    }

    /// Replaces one field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Alias => &mut self.alias,
            Field::Description => &mut self.description,
            Field::Powers => &mut self.powers,
        };
        *slot = value.into();
    }
}

impl From<&Character> for CharacterFields {
    fn from(character: &Character) -> Self {
        character.fields()
    }
}

// =========================================================================
// Tests
// =========================================================================
