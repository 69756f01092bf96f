//! Cursor connection resolution for pressgql.
//!
//! This crate turns connection arguments into one backend query and the rows
//! it returns into a Relay-style connection:
//! - `translate`: Client-to-native argument translation and hooks
//! - `plan`: Query planning (page size, ordering, cursor bounds, scope)
//! - `assemble`: Edges, nodes and page info
//! - `kind`: The interface each entity kind implements
//! - `resolver`: The `resolve(source, args, context)` façade

pub mod assemble;
pub mod kind;
pub mod plan;
pub mod resolver;
pub mod translate;

pub use assemble::{assemble, Connection, Edge, PageInfo};
pub use kind::{EntityKind, Node, OrderField, Scope, ScopeConstraint, SortOrder};
pub use plan::{Compare, CursorBound, QueryPlanner, QuerySpec};
pub use resolver::ConnectionResolver;
pub use translate::{apply_hooks, ArgsHook, FieldMapping, HookInput, TranslationTable};

pub use pressgql_core::{
    BackendError, ConnectionArgs, ConnectionConfig, ConnectionError, ConnectionResult, Context,
    Cursor, FilterMap,
};
