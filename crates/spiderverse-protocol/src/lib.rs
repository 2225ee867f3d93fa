//! Wire protocol for the Spider-Verse client.
//!
//! This crate defines the JSON the client and the characters API exchange:
//!
//! - **Types** ([`Character`], [`CharacterFields`], [`CharacterId`]):
//!   the records and request bodies.
//! - **Envelope** ([`ApiResponse`]): the `{ success, data }` wrapper
//!   around every response.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the raw JSON the transport returns and
//! the controllers that own client state. It knows nothing about HTTP or
//! sessions.
//!
//! ```text
//! Transport (JSON value) → Protocol (ApiResponse, Character) → Collection
//! ```

mod envelope;
mod error;
mod types;

pub use envelope::{encode_fields, ApiResponse};
pub use error::ProtocolError;
pub use types::{
    character_path, Character, CharacterFields, CharacterId, Field,
    CHARACTERS_PATH,
};
