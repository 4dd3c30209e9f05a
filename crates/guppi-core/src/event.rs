//! Event decoding for incoming socket payloads.
//!
//! A client delivers exactly one JSON object per connection. The decoded
//! [`Event`] is immutable and serves as the substitution context for shell
//! command templates and as the first argument to function actions.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Maximum number of bytes read from a client connection.
///
/// The connection handler performs a single bounded read; a payload larger
/// than this is truncated, not reassembled. Callers must not assume larger
/// payloads survive intact.
pub const MAX_REQUEST_BYTES: usize = 1024;

/// Environment mapping passed to every action invocation.
///
/// Currently always empty, but it is a first-class parameter of the action
/// contract and stays explicit.
pub type Env = BTreeMap<String, String>;

/// A decoded event: one string-keyed JSON object.
///
/// No schema is enforced beyond "valid JSON object"; unknown keys are inert
/// until a specific action references them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event(Map<String, Value>);

/// Failure to turn a raw payload into an [`Event`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is valid JSON but not an object")]
    NotAnObject,
}

impl Event {
    /// Decode a raw byte payload into an event.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the payload is not valid JSON or is
    /// valid JSON but not an object. The caller logs the error and aborts
    /// the connection; no actions run for an undecodable payload.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        match serde_json::from_slice::<Value>(raw)? {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(DecodeError::NotAnObject),
        }
    }

    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of fields in the event.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
