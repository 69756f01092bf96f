//! Core types for pressgql.
//!
//! This crate provides the types shared by the connection engine and the
//! entity kinds plugged into it:
//! - `cursor`: Opaque cursor encoding
//! - `args`: Connection arguments and filter maps
//! - `config`: Page size configuration
//! - `context`: Request-scoped context
//! - `error`: Typed errors

pub mod args;
pub mod config;
pub mod context;
pub mod cursor;
pub mod error;

pub use args::{ConnectionArgs, Direction, FilterMap};
pub use config::ConnectionConfig;
pub use context::{Context, TypedContext};
pub use cursor::Cursor;
pub use error::{BackendError, ConnectionError, ConnectionResult, ErrorCode};
