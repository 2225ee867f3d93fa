//! Remote store abstraction for the Spider-Verse client.
//!
//! Provides the [`RemoteStore`] trait: the single "send a request, get
//! JSON back" capability the controllers depend on. The controllers never
//! see HTTP; tests swap in scripted stores.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpRemoteStore`] over HTTP via `reqwest`
//!
//! [`MemoryRemoteStore`] is always available: an in-memory stand-in for
//! the API with fault injection.

mod error;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpRemoteStore, HttpStoreConfig, DEFAULT_API_URL};
pub use memory::{Fault, MemoryRemoteStore, RecordedRequest};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// Method and optional JSON body of a request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
}

impl RequestOptions {
    /// A `GET` without a body.
    pub fn get() -> Self {
        Self::default()
    }

    /// A `POST` carrying `body`.
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
        }
    }

    /// A `PUT` carrying `body`.
    pub fn put(body: Value) -> Self {
        Self {
            method: Method::Put,
            body: Some(body),
        }
    }

    /// A `DELETE` without a body.
    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            body: None,
        }
    }
}

/// Sends JSON requests to a fixed base address and returns the parsed
/// JSON response.
///
/// The base address is the implementation's concern; callers only pass
/// the path (`/characters`, `/characters/7`).
///
/// Implementations fail with a [`TransportError`] when the request could
/// not complete or the body is not JSON. They do not interpret the body:
/// a response saying `{"success": false}` is still `Ok`.
pub trait RemoteStore: Send + Sync + 'static {
    /// Sends one request and waits for its JSON response.
    fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

impl<S: RemoteStore> RemoteStore for Arc<S> {
    fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        S::request(self, path, options)
    }
}
