//! Connection resolver façade.

use crate::assemble::{assemble, Connection};
use crate::kind::EntityKind;
use crate::plan::QueryPlanner;
use crate::translate::{apply_hooks, ArgsHook, HookInput};
use pressgql_core::{
    ConnectionArgs, ConnectionConfig, ConnectionResult, Context, FilterMap,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Resolves connections of one entity kind.
///
/// A resolver holds only immutable configuration (its kind, hooks and an
/// optional page size override), so one instance serves concurrent requests.
///
/// # Example
///
/// ```ignore
/// let resolver = ConnectionResolver::new(PostKind::new(store))
///     .hook(|mut native, input| {
///         native.insert("post_status".into(), json!("publish"));
///         Ok(native)
///     });
///
/// let page = resolver
///     .resolve(Some(&author), &ConnectionArgs::new().first(10), &ctx)
///     .await?;
/// ```
pub struct ConnectionResolver<K: EntityKind> {
    kind: K,
    hooks: Vec<ArgsHook<K::Source>>,
    config: Option<Arc<ConnectionConfig>>,
}

impl<K: EntityKind> ConnectionResolver<K> {
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            hooks: Vec::new(),
            config: None,
        }
    }

    /// Registers an argument transform, run after static translation and
    /// after every previously registered hook.
    pub fn hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(FilterMap, &HookInput<'_, K::Source>) -> ConnectionResult<FilterMap>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Overrides the context's page size configuration for this connection.
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Resolves one occurrence of the connection field.
    pub async fn resolve(
        &self,
        source: Option<&K::Source>,
        args: &ConnectionArgs,
        context: &Context,
    ) -> ConnectionResult<Connection<K::Node>> {
        let empty = FilterMap::new();
        let original = args.filter.as_ref().unwrap_or(&empty);

        let native = {
            let input = HookInput {
                original,
                source,
                args,
                context,
            };
            apply_hooks(self.kind.translate(original), &self.hooks, &input)?
        };
        self.kind.validate(&native)?;

        let config = self.config.as_deref().unwrap_or_else(|| context.config());
        let spec = QueryPlanner::new(config).plan(&self.kind, args, native, source)?;

        let rows = self.kind.execute(&spec).await?;
        let fetched = rows.len();
        let connection = assemble(rows, args, spec.page_size);

        debug!(
            entity = self.kind.name(),
            requested = spec.requested_count,
            fetched,
            edges = connection.len(),
            order = %spec.order,
            "resolved connection"
        );
        Ok(connection)
    }

    /// Resolves from the raw argument object of the field-dispatch layer.
    pub async fn resolve_value(
        &self,
        source: Option<&K::Source>,
        args: Value,
        context: &Context,
    ) -> ConnectionResult<Connection<K::Node>> {
        let args = ConnectionArgs::from_value(args)?;
        self.resolve(source, &args, context).await
    }
}

impl<K: EntityKind> fmt::Debug for ConnectionResolver<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionResolver")
            .field("kind", &self.kind.name())
            .field("hooks", &self.hooks.len())
            .field("config", &self.config)
            .finish()
    }
}
