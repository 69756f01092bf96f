//! Client-to-native argument translation.

use pressgql_core::{ConnectionArgs, ConnectionResult, Context, FilterMap};
use std::sync::Arc;

/// How one client-facing filter field reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMapping {
    /// Forwarded under a different native name.
    Rename(&'static str),
    /// Accepted from clients but never forwarded.
    Drop,
    /// Not in the table; forwarded unchanged.
    PassThrough,
}

/// Static `clientName -> mapping` table owned by an entity kind.
#[derive(Debug, Clone, Copy)]
pub struct TranslationTable {
    entries: &'static [(&'static str, FieldMapping)],
}

impl TranslationTable {
    pub const fn new(entries: &'static [(&'static str, FieldMapping)]) -> Self {
        Self { entries }
    }

    /// Looks up a client field. Unknown fields map to `PassThrough`.
    pub fn lookup(&self, client: &str) -> FieldMapping {
        self.entries
            .iter()
            .find(|(name, _)| *name == client)
            .map_or(FieldMapping::PassThrough, |(_, mapping)| *mapping)
    }

    /// Translates a client `where` object, preserving entry order.
    ///
    /// When several client fields map to the same native key the last one
    /// supplied wins.
    pub fn translate(&self, filter: &FilterMap) -> FilterMap {
        let mut native = FilterMap::with_capacity(filter.len());
        for (key, value) in filter {
            match self.lookup(key) {
                FieldMapping::Rename(to) => {
                    native.insert(to.to_string(), value.clone());
                }
                FieldMapping::PassThrough => {
                    native.insert(key.clone(), value.clone());
                }
                FieldMapping::Drop => {}
            }
        }
        native
    }
}

/// Everything a hook may consult besides the native arguments.
pub struct HookInput<'a, S> {
    /// The client's untranslated `where` object.
    pub original: &'a FilterMap,
    /// The object the connection hangs off of, if any.
    pub source: Option<&'a S>,
    /// All connection arguments.
    pub args: &'a ConnectionArgs,
    pub context: &'a Context,
}

/// A transform applied to translated arguments.
pub type ArgsHook<S> =
    Arc<dyn Fn(FilterMap, &HookInput<'_, S>) -> ConnectionResult<FilterMap> + Send + Sync>;

/// Runs hooks in registration order over already-translated arguments.
pub fn apply_hooks<S>(
    mut native: FilterMap,
    hooks: &[ArgsHook<S>],
    input: &HookInput<'_, S>,
) -> ConnectionResult<FilterMap> {
    for hook in hooks {
        native = hook(native, input)?;
    }
    Ok(native)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressgql_core::ConnectionError;
    use serde_json::json;

    const TABLE: TranslationTable = TranslationTable::new(&[
        ("authorIn", FieldMapping::Rename("author__in")),
        ("search", FieldMapping::Rename("s")),
        ("status", FieldMapping::Rename("post_status")),
        ("stati", FieldMapping::Rename("post_status")),
        ("cacheDomain", FieldMapping::Drop),
    ]);

    fn filter(entries: &[(&str, serde_json::Value)]) -> FilterMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_lookup_is_explicit() {
        assert_eq!(TABLE.lookup("search"), FieldMapping::Rename("s"));
        assert_eq!(TABLE.lookup("cacheDomain"), FieldMapping::Drop);
        assert_eq!(TABLE.lookup("mystery"), FieldMapping::PassThrough);
    }

    #[test]
    fn test_translate_renames_drops_and_passes_through() {
        let native = TABLE.translate(&filter(&[
            ("search", json!("rust")),
            ("cacheDomain", json!("x")),
            ("mystery", json!(1)),
            ("authorIn", json!([1, 2])),
        ]));

        let keys: Vec<_> = native.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["s", "mystery", "author__in"]);
        assert_eq!(native["author__in"], json!([1, 2]));
    }

    #[test]
    fn test_last_alias_wins() {
        let native = TABLE.translate(&filter(&[
            ("status", json!("draft")),
            ("stati", json!(["publish"])),
        ]));
        assert_eq!(native.len(), 1);
        assert_eq!(native["post_status"], json!(["publish"]));
    }

    #[test]
    fn test_hooks_run_in_order() {
        let add: ArgsHook<()> = Arc::new(|mut native: FilterMap, _: &HookInput<'_, ()>| {
            native.insert("post_type".into(), json!("page"));
            Ok(native)
        });
        let remove: ArgsHook<()> = Arc::new(|mut native: FilterMap, input: &HookInput<'_, ()>| {
            native.shift_remove("s");
            assert!(input.original.contains_key("search"));
            Ok(native)
        });

        let original = filter(&[("search", json!("rust"))]);
        let args = ConnectionArgs::new();
        let context = Context::new();
        let input = HookInput {
            original: &original,
            source: None,
            args: &args,
            context: &context,
        };

        let native = apply_hooks(TABLE.translate(&original), &[add, remove], &input).unwrap();
        assert_eq!(native.len(), 1);
        assert_eq!(native["post_type"], json!("page"));
    }

    #[test]
    fn test_hook_error_stops_pipeline() {
        let reject: ArgsHook<()> = Arc::new(|_: FilterMap, _: &HookInput<'_, ()>| {
            Err(ConnectionError::invalid_argument("search", "too short"))
        });
        let original = FilterMap::new();
        let args = ConnectionArgs::new();
        let context = Context::new();
        let input = HookInput {
            original: &original,
            source: None,
            args: &args,
            context: &context,
        };

        let err = apply_hooks(FilterMap::new(), &[reject], &input).unwrap_err();
        assert_eq!(err.field(), Some("search"));
    }
}
