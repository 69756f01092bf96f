//! Typed errors for connection resolution.
//!
//! Every failure raised while resolving a connection is one of three kinds:
//! an undecodable cursor, an argument combination that violates a declared
//! invariant, or a failure of the backing query itself. None of them is caught
//! inside the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Typed error codes surfaced to the field-dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MalformedCursor,
    InvalidArgument,
    BackendQueryFailure,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedCursor => "MALFORMED_CURSOR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::BackendQueryFailure => "BACKEND_QUERY_FAILURE",
        }
    }

    /// Returns true if the request itself was at fault (4xx equivalent).
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedCursor | Self::InvalidArgument)
    }

    /// Returns true if the backing store was at fault (5xx equivalent).
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::BackendQueryFailure)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure reported by an entity kind's backing query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity} query failed: {message}")]
pub struct BackendError {
    /// Entity kind whose executor failed.
    pub entity: String,
    /// Human-readable failure description.
    pub message: String,
}

impl BackendError {
    pub fn new(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

/// Error raised by `resolve`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// An `after`/`before` value could not be decoded.
    #[error("malformed cursor \"{cursor}\": {reason}")]
    MalformedCursor { cursor: String, reason: String },

    /// A filter or ordering combination violates a declared invariant.
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },

    /// The backing query failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ConnectionError {
    /// Creates a malformed cursor error.
    pub fn malformed_cursor(cursor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCursor {
            cursor: cursor.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid argument error for the given field.
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a backend failure for the given entity kind.
    pub fn backend(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend(BackendError::new(entity, message))
    }

    /// Returns the typed error code.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedCursor { .. } => ErrorCode::MalformedCursor,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Backend(_) => ErrorCode::BackendQueryFailure,
        }
    }

    /// Returns the offending field for argument errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns true if this is a client error.
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }
}

impl Serialize for ConnectionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ConnectionError", 3)?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("message", &self.to_string())?;
        match self {
            Self::MalformedCursor { cursor, .. } => {
                state.serialize_field("extensions", &serde_json::json!({ "cursor": cursor }))?;
            }
            Self::InvalidArgument { field, .. } => {
                state.serialize_field("extensions", &serde_json::json!({ "field": field }))?;
            }
            Self::Backend(err) => {
                state.serialize_field("extensions", &serde_json::json!({ "entity": err.entity }))?;
            }
        }
        state.end()
    }
}

/// Type alias for connection results.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;
