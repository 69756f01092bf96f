//! Request-scoped context passed to every resolution.
//!
//! Request data is keyed by `TypeId`, so hooks retrieve what the host stored
//! (the current viewer, a locale, ...) without string keys.

use crate::config::ConnectionConfig;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-keyed storage for request-scoped data.
///
/// # Example
///
/// ```
/// use pressgql_core::context::TypedContext;
///
/// #[derive(Clone)]
/// struct ViewerId(u64);
///
/// let mut data = TypedContext::new();
/// data.insert(ViewerId(7));
///
/// let viewer: Option<&ViewerId> = data.get();
/// assert_eq!(viewer.unwrap().0, 7);
/// ```
#[derive(Default)]
pub struct TypedContext {
    data: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl TypedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.data
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.data
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for TypedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedContext")
            .field("data_count", &self.data.len())
            .finish()
    }
}

/// Context of a single resolution call.
#[derive(Debug, Clone)]
pub struct Context {
    config: Arc<ConnectionConfig>,
    data: Arc<TypedContext>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with the default configuration and no request data.
    pub fn new() -> Self {
        Self::with_config(Arc::new(ConnectionConfig::default()))
    }

    /// Creates a context sharing the process-wide configuration.
    pub fn with_config(config: Arc<ConnectionConfig>) -> Self {
        Self {
            config,
            data: Arc::new(TypedContext::new()),
        }
    }

    /// Attaches request data.
    pub fn with_data(mut self, data: TypedContext) -> Self {
        self.data = Arc::new(data);
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Gets request data by type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct ViewerId(u64);

    #[test]
    fn test_typed_context() {
        let mut data = TypedContext::new();
        assert!(data.insert(ViewerId(1)).is_none());
        assert_eq!(data.insert(ViewerId(2)), Some(ViewerId(1)));
        assert!(data.contains::<ViewerId>());
        assert!(!data.contains::<String>());
        assert_eq!(data.remove::<ViewerId>(), Some(ViewerId(2)));
        assert!(data.is_empty());
    }

    #[test]
    fn test_context_exposes_config_and_data() {
        let mut data = TypedContext::new();
        data.insert(ViewerId(9));
        let ctx = Context::with_config(Arc::new(ConnectionConfig::new().max_page_size(5)))
            .with_data(data);

        assert_eq!(ctx.config().max_page_size, 5);
        assert_eq!(ctx.get::<ViewerId>(), Some(&ViewerId(9)));
    }
}
