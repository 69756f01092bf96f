//! The interface every entity kind implements.
//!
//! An entity kind (posts, comments, terms, users) owns everything that
//! differs between connections: its translation table, its orderable fields,
//! how a parent object scopes the result set, and how a planned query runs
//! against the backing store. Planning and assembly are shared.

use crate::plan::QuerySpec;
use crate::translate::TranslationTable;
use async_trait::async_trait;
use pressgql_core::{BackendError, ConnectionResult, FilterMap};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A row that can appear as a connection node.
pub trait Node: Clone + Send + Sync {
    /// Unique, orderable identifier encoded into the row's cursor.
    fn cursor_id(&self) -> u64;
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Parses `ASC` / `DESC`, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An orderable field declared by an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderField {
    /// Client-facing enum value, e.g. `DATE`.
    pub name: &'static str,
    /// Backend-native sort key, e.g. `date`.
    pub native: &'static str,
    /// Native list argument that must be supplied to order by this field.
    pub requires: Option<&'static str>,
}

impl OrderField {
    pub const fn new(name: &'static str, native: &'static str) -> Self {
        Self {
            name,
            native,
            requires: None,
        }
    }

    /// Declares a relation-list ordering ("in the order of this id list").
    pub const fn requires(mut self, list_key: &'static str) -> Self {
        self.requires = Some(list_key);
        self
    }

    pub fn is_relation(&self) -> bool {
        self.requires.is_some()
    }
}

/// One constraint tying a connection to the object it hangs off of.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeConstraint {
    pub key: String,
    pub value: Value,
    /// Strict constraints always replace the client's value.
    pub strict: bool,
    /// Native keys whose presence disables a non-strict constraint.
    pub yields_to: Vec<String>,
}

/// Source-derived scope of a connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    constraints: Vec<ScopeConstraint>,
}

impl Scope {
    /// An unscoped connection.
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds a mandatory constraint.
    pub fn strict(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.push(ScopeConstraint {
            key: key.into(),
            value: value.into(),
            strict: true,
            yields_to: Vec::new(),
        });
        self
    }

    /// Adds a default constraint the client may replace by supplying the key
    /// itself or any of `yields_to`.
    pub fn soft(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        yields_to: &[&str],
    ) -> Self {
        self.constraints.push(ScopeConstraint {
            key: key.into(),
            value: value.into(),
            strict: false,
            yields_to: yields_to.iter().map(|k| (*k).to_string()).collect(),
        });
        self
    }

    pub fn constraints(&self) -> &[ScopeConstraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Injects the scope into native arguments.
    pub fn apply(&self, native: &mut FilterMap) {
        for constraint in &self.constraints {
            if constraint.strict {
                native.insert(constraint.key.clone(), constraint.value.clone());
                continue;
            }
            let overridden = native.contains_key(&constraint.key)
                || constraint.yields_to.iter().any(|k| native.contains_key(k));
            if !overridden {
                native.insert(constraint.key.clone(), constraint.value.clone());
            }
        }
    }
}

/// An entity kind pluggable into a `ConnectionResolver`.
#[async_trait]
pub trait EntityKind: Send + Sync {
    /// The object a connection of this kind can hang off of.
    type Source: Send + Sync;
    /// The row type returned by the executor.
    type Node: Node;

    /// Name used in logs and backend errors.
    fn name(&self) -> &'static str;

    /// Static client-to-native field mapping.
    fn translation_table(&self) -> &TranslationTable;

    /// Fields clients may order by.
    fn order_fields(&self) -> &'static [OrderField];

    /// Ordering used when the client supplies none.
    fn default_order(&self) -> (OrderField, SortOrder);

    /// Statically translates the client's `where` object.
    fn translate(&self, filter: &FilterMap) -> FilterMap {
        self.translation_table().translate(filter)
    }

    /// Checks cross-field invariants of the translated arguments.
    fn validate(&self, _native: &FilterMap) -> ConnectionResult<()> {
        Ok(())
    }

    /// Mandatory scope for connections reached from `source`.
    fn plan_scope(&self, source: Option<&Self::Source>) -> Scope;

    /// Runs the planned query against the backing store.
    async fn execute(&self, spec: &QuerySpec) -> Result<Vec<Self::Node>, BackendError>;
}
