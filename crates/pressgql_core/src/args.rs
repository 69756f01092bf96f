//! Connection arguments as handed over by the field-dispatch layer.

use crate::cursor::Cursor;
use crate::error::{ConnectionError, ConnectionResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered mapping from filter names to values.
///
/// Used both for the client-facing `where` object and for the backend-native
/// arguments it is translated into.
pub type FilterMap = IndexMap<String, Value>;

/// Pagination direction of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Arguments of a connection field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionArgs {
    #[serde(default)]
    pub first: Option<usize>,
    #[serde(default)]
    pub last: Option<usize>,
    #[serde(default)]
    pub after: Option<Cursor>,
    #[serde(default)]
    pub before: Option<Cursor>,
    #[serde(rename = "where", default)]
    pub filter: Option<FilterMap>,
}

impl ConnectionArgs {
    /// Creates empty connection args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the raw argument object of a connection field.
    ///
    /// Negative counts, non-string cursors and a non-object `where` are
    /// rejected as invalid arguments.
    pub fn from_value(value: Value) -> ConnectionResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| ConnectionError::invalid_argument("args", e.to_string()))
    }

    pub fn first(mut self, first: usize) -> Self {
        self.first = Some(first);
        self
    }

    pub fn last(mut self, last: usize) -> Self {
        self.last = Some(last);
        self
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.after = Some(cursor);
        self
    }

    pub fn before(mut self, cursor: Cursor) -> Self {
        self.before = Some(cursor);
        self
    }

    /// Adds a single `where` entry.
    pub fn filter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.filter
            .get_or_insert_with(FilterMap::new)
            .insert(name.into(), value);
        self
    }

    /// Replaces the whole `where` object.
    pub fn with_filter(mut self, filter: FilterMap) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Gets a `where` entry by name.
    pub fn filter_value(&self, name: &str) -> Option<&Value> {
        self.filter.as_ref().and_then(|f| f.get(name))
    }

    /// Backward pagination means `last` without `first`.
    pub fn direction(&self) -> Direction {
        if self.last.is_some() && self.first.is_none() {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    pub fn is_backward(&self) -> bool {
        self.direction() == Direction::Backward
    }
}
