//! Authentication state for the Spider-Verse client.
//!
//! This crate decides who the client is acting for:
//!
//! 1. **Identity provider contract**: what the client needs from the
//!    provider ([`AuthGateway`] trait, [`Subscription`] handle)
//! 2. **Session tracking**: the derived three-state [`Session`] and the
//!    [`Screen`] it gates ([`SessionController`])
//! 3. **Scopes**: [`SessionScope`] lets per-user state notice that its
//!    user is gone
//!
//! [`LocalAuthGateway`] is an in-memory provider for demos and tests.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)  ← mounts the collection while a session is authenticated
//!     ↕
//! Session Layer (this crate)  ← tracks identity and screen gating
//!     ↕
//! Identity provider (outside)  ← login, registration, token persistence
//! ```

mod auth;
mod controller;
mod error;
mod local;
mod session;

pub use auth::{AuthGateway, AuthListener, Identity, Subscription};
pub use controller::SessionController;
pub use error::SessionError;
pub use local::LocalAuthGateway;
pub use session::{Screen, Session, SessionScope};
