//! # Spider-Verse
//!
//! Client core for managing a personal collection of Spider-Verse
//! characters through a remote API.
//!
//! The client tracks who is signed in, decides which top-level screen to
//! show, and while a user is signed in keeps their character collection
//! in step with the server. The identity provider and the presentation
//! live outside this crate: the provider is plugged in through
//! [`AuthGateway`](spiderverse_session::AuthGateway), and the
//! presentation reads state from [`Client`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use spiderverse::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let gateway = Arc::new(LocalAuthGateway::resolved(None));
//! let mut client = Client::connect(gateway.clone(), ClientConfig::from_env()?)?;
//!
//! gateway.sign_in("peter@dailybugle.com");
//! client.sync().await?;
//!
//! client.form_mut().open_new();
//! client.form_mut().set_field(Field::Name, "Miles Morales")?;
//! let _outcome = client.submit_form().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod telemetry;

pub use client::Client;
pub use config::{ClientConfig, API_URL_VAR, TIMEOUT_VAR};
pub use error::ClientError;

pub use spiderverse_collection as collection;
pub use spiderverse_protocol as protocol;
pub use spiderverse_session as session;
pub use spiderverse_transport as transport;

/// Common imports for driving the client.
pub mod prelude {
    pub use crate::{Client, ClientConfig, ClientError};
    pub use spiderverse_collection::{
        CharacterCollectionController, CollectionError, DeleteConfirmation, Draft,
        EditSessionController, EditState, ErrorKind, Operation, Reconcile, ValidationError,
    };
    pub use spiderverse_protocol::{Character, CharacterFields, CharacterId, Field};
    pub use spiderverse_session::{
        AuthGateway, Identity, LocalAuthGateway, Screen, Session, SessionController,
    };
    pub use spiderverse_transport::{
        HttpRemoteStore, HttpStoreConfig, MemoryRemoteStore, RemoteStore,
    };
}
