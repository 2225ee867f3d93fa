//! An in-memory [`RemoteStore`] that behaves like the characters API.
//!
//! [`MemoryRemoteStore`] answers the same four routes as the real server
//! with the same `{ success, data, message }` envelopes, assigns ids
//! server-side, and records every request it sees. Faults can be queued
//! to make the next request fail at the transport level or be declined
//! by the "server". The console demo uses it for offline runs; the
//! controller tests use it to count network calls and inject failures.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{json, Map, Value};

use crate::{Method, RemoteStore, RequestOptions, TransportError};

const COLLECTION: &str = "/characters";

/// A request as the store received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// A failure to inject into the next request.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// The request never completes: reported as a transport error.
    Network,

    /// The server answers `{"success": false}` with an optional message.
    Reject(Option<String>),

    /// The server answers with this exact body, bypassing the routes.
    Respond(Value),
}

#[derive(Default)]
struct MemoryState {
    records: Vec<Map<String, Value>>,
    next_id: u64,
    requests: Vec<RecordedRequest>,
    faults: VecDeque<Fault>,
}

/// An in-memory stand-in for the characters API.
#[derive(Default)]
pub struct MemoryRemoteStore {
    state: Mutex<MemoryState>,
}

impl MemoryRemoteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record directly, as if created earlier, and returns its
    /// assigned id. `record` should be an object with at least a `name`.
    pub fn insert(&self, record: Value) -> String {
        let mut state = self.lock();
        let fields = match record {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("name".into(), other);
                map
            }
        };
        insert_record(&mut state, fields)
    }

    /// Queues a fault for the next request that reaches the store.
    /// Faults are consumed in the order they were queued.
    pub fn fail_next(&self, fault: Fault) {
        self.lock().faults.push_back(fault);
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Returns the stored records in list order.
    pub fn records(&self) -> Vec<Value> {
        self.lock()
            .records
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, path: &str, options: RequestOptions) -> Result<Value, TransportError> {
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            method: options.method,
            path: path.to_string(),
            body: options.body.clone(),
        });

        if let Some(fault) = state.faults.pop_front() {
            return match fault {
                Fault::Network => Err(TransportError::RequestFailed(format!(
                    "injected network failure on {} {path}",
                    options.method
                ))),
                Fault::Reject(message) => Ok(rejected(message.as_deref())),
                Fault::Respond(body) => Ok(body),
            };
        }

        let id = path
            .strip_prefix(COLLECTION)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|id| !id.is_empty() && !id.contains('/'));

        let response = match (options.method, path, id) {
            (Method::Get, COLLECTION, _) => {
                let data: Vec<Value> =
                    state.records.iter().cloned().map(Value::Object).collect();
                json!({ "success": true, "data": data })
            }
            (Method::Post, COLLECTION, _) => match body_fields(options.body) {
                Some(fields) => {
                    let id = insert_record(&mut state, fields);
                    let record = state.records.iter().find(|r| has_id(r, &id)).cloned();
                    json!({ "success": true, "data": record })
                }
                None => rejected(Some("name is required")),
            },
            (Method::Put, _, Some(id)) => match body_fields(options.body) {
                Some(fields) => match state.records.iter_mut().find(|r| has_id(r, id)) {
                    Some(record) => {
                        for (key, value) in fields {
                            if key != "id" {
                                record.insert(key, value);
                            }
                        }
                        json!({ "success": true, "data": Value::Object(record.clone()) })
                    }
                    None => rejected(Some("character not found")),
                },
                None => rejected(Some("name is required")),
            },
            (Method::Delete, _, Some(id)) => {
                let before = state.records.len();
                state.records.retain(|r| !has_id(r, id));
                if state.records.len() < before {
                    json!({ "success": true })
                } else {
                    rejected(Some("character not found"))
                }
            }
            _ => rejected(Some("route not found")),
        };

        Ok(response)
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, TransportError> {
        self.handle(path, options)
    }
}

fn rejected(message: Option<&str>) -> Value {
    match message {
        Some(message) => json!({ "success": false, "message": message }),
        None => json!({ "success": false }),
    }
}

fn has_id(record: &Map<String, Value>, id: &str) -> bool {
    record.get("id").and_then(Value::as_str) == Some(id)
}

/// Extracts an object body with a non-blank `name`, like the server's
/// own validation.
fn body_fields(body: Option<Value>) -> Option<Map<String, Value>> {
    let Some(Value::Object(fields)) = body else {
        return None;
    };
    let named = fields
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    named.then_some(fields)
}

fn insert_record(state: &mut MemoryState, mut fields: Map<String, Value>) -> String {
    state.next_id += 1;
    let id = state.next_id.to_string();
    fields.insert("id".into(), Value::String(id.clone()));
    state.records.push(fields);
    id
}
