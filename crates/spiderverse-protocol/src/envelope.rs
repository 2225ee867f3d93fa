//! The `{ success, data, message }` envelope every API response uses.
//!
//! The server answers every call with a JSON object whose `success` flag
//! says whether the operation went through. A well-formed envelope with
//! `success: false` is the server declining the operation; anything that
//! doesn't parse as an envelope at all is a protocol failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Character, CharacterFields, ProtocolError};

/// A decoded API response.
///
/// `data` stays as raw JSON until the caller knows what it expects
/// (a list for `GET /characters`, nothing in particular for mutations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the server accepted the operation.
    pub success: bool,

    /// The payload, if any.
    #[serde(default)]
    pub data: Option<Value>,

    /// A human-readable explanation, usually only present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    /// Parses a raw JSON body as an envelope.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the body is not an object with
    /// a boolean `success` key.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }

    /// Decodes `data` into `T`.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidMessage`] if there is no `data`
    /// - [`ProtocolError::Decode`] if `data` has the wrong shape
    pub fn data_as<T: DeserializeOwned>(self) -> Result<T, ProtocolError> {
        let data = self.data.ok_or_else(|| {
            ProtocolError::InvalidMessage("response has no data".into())
        })?;
        serde_json::from_value(data).map_err(ProtocolError::Decode)
    }

    /// Decodes `data` as the ordered character list.
    ///
    /// # Errors
    /// Same as [`data_as`](Self::data_as).
    pub fn into_characters(self) -> Result<Vec<Character>, ProtocolError> {
        self.data_as()
    }
}

/// Encodes a create/update request body.
///
/// # Errors
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_fields(fields: &CharacterFields) -> Result<Value, ProtocolError> {
    serde_json::to_value(fields).map_err(ProtocolError::Encode)
}
