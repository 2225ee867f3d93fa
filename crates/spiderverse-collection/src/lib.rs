//! Character collection management for the Spider-Verse client.
//!
//! Everything the home screen does to the signed-in user's characters
//! goes through this crate. The collection is server-authoritative: it is
//! only ever replaced by a fresh fetch, never patched locally.
//!
//! # Key types
//!
//! - [`CharacterCollectionController`]: load, create, update, delete, and
//!   reconcile after each mutation
//! - [`EditSessionController`]: the create/edit form and its [`Draft`]
//! - [`DeleteConfirmation`]: the token a delete requires
//! - [`CollectionError`]: what went wrong, classified by [`ErrorKind`]

mod controller;
mod draft;
mod edit;
mod error;

pub use controller::{CharacterCollectionController, DeleteConfirmation, Operation, Reconcile};
pub use draft::{Draft, EditState};
pub use edit::EditSessionController;
pub use error::{CollectionError, ErrorKind, ValidationError};
