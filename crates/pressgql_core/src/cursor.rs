//! Opaque pagination cursors.
//!
//! A cursor is the base64 encoding of `arrayconnection:<id>`, where `<id>` is
//! the row's unique integer identifier. The same id always produces the same
//! cursor regardless of which query returned the row.

use crate::error::{ConnectionError, ConnectionResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

const PREFIX: &str = "arrayconnection:";

/// An opaque cursor string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Encodes a row id.
    pub fn encode(id: u64) -> Self {
        Self(STANDARD.encode(format!("{PREFIX}{id}")))
    }

    /// Wraps a raw client-supplied cursor string without validating it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Decodes the row id, failing with `MalformedCursor`.
    pub fn decode(&self) -> ConnectionResult<u64> {
        decode(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encodes a row id into a cursor.
pub fn encode(id: u64) -> Cursor {
    Cursor::encode(id)
}

/// Decodes a cursor string into a row id.
pub fn decode(raw: &str) -> ConnectionResult<u64> {
    let bytes = STANDARD
        .decode(raw)
        .map_err(|e| ConnectionError::malformed_cursor(raw, e.to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ConnectionError::malformed_cursor(raw, "cursor is not valid UTF-8"))?;
    let id = text
        .strip_prefix(PREFIX)
        .ok_or_else(|| ConnectionError::malformed_cursor(raw, "unrecognised cursor prefix"))?;
    id.parse::<u64>()
        .map_err(|e| ConnectionError::malformed_cursor(raw, format!("invalid row id: {e}")))
}
