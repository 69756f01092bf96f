//! End-to-end pagination scenarios against a spy entity kind.

use async_trait::async_trait;
use pressgql_connection::{
    BackendError, Compare, ConnectionArgs, ConnectionConfig, ConnectionError, ConnectionResolver,
    Context, Cursor, EntityKind, FieldMapping, FilterMap, HookInput, Node, OrderField, QuerySpec,
    Scope, SortOrder, TranslationTable,
};
use pressgql_core::{ErrorCode, TypedContext};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u64,
    group: u64,
}

impl Node for Item {
    fn cursor_id(&self) -> u64 {
        self.id
    }
}

const ID: OrderField = OrderField::new("ID", "id");
const FIELDS: &[OrderField] = &[ID, OrderField::new("IN", "id").requires("id__in")];
const TABLE: TranslationTable = TranslationTable::new(&[
    ("in", FieldMapping::Rename("id__in")),
    ("group", FieldMapping::Rename("group_id")),
]);

/// Items ordered by id, scoped by group, counting executions.
struct SpyKind {
    items: Vec<Item>,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl SpyKind {
    fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }
}

fn id_list(value: Option<&Value>) -> Option<Vec<u64>> {
    value
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
}

#[async_trait]
impl EntityKind for SpyKind {
    type Source = u64;
    type Node = Item;

    fn name(&self) -> &'static str {
        "items"
    }

    fn translation_table(&self) -> &TranslationTable {
        &TABLE
    }

    fn order_fields(&self) -> &'static [OrderField] {
        FIELDS
    }

    fn default_order(&self) -> (OrderField, SortOrder) {
        (ID, SortOrder::Asc)
    }

    fn plan_scope(&self, source: Option<&u64>) -> Scope {
        source.map_or_else(Scope::none, |group| Scope::none().strict("group_id", *group))
    }

    async fn execute(&self, spec: &QuerySpec) -> Result<Vec<Item>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BackendError::new("items", "store unavailable"));
        }
        let group = spec.arg("group_id").and_then(Value::as_u64);
        let only = id_list(spec.arg("id__in"));
        let mut rows: Vec<Item> = self
            .items
            .iter()
            .filter(|item| group.map_or(true, |g| item.group == g))
            .filter(|item| only.as_ref().map_or(true, |ids| ids.contains(&item.id)))
            .filter(|item| {
                spec.bounds.iter().all(|bound| match bound.compare {
                    Compare::Greater => item.id > bound.id,
                    Compare::Less => item.id < bound.id,
                })
            })
            .cloned()
            .collect();
        rows.sort_by_key(|item| item.id);
        if spec.order == SortOrder::Desc {
            rows.reverse();
        }
        rows.truncate(spec.requested_count);
        Ok(rows)
    }
}

fn items(count: u64) -> Vec<Item> {
    (1..=count).map(|id| Item { id, group: 1 }).collect()
}

fn resolver(count: u64) -> ConnectionResolver<SpyKind> {
    ConnectionResolver::new(SpyKind::new(items(count)))
}

#[tokio::test]
async fn test_first_page_of_25() {
    let connection = resolver(25)
        .resolve(None, &ConnectionArgs::new().first(10), &Context::new())
        .await
        .unwrap();

    assert_eq!(connection.cursor_ids(), (1..=10).collect::<Vec<_>>());
    assert!(connection.page_info.has_next_page);
    assert!(!connection.page_info.has_previous_page);
    assert_eq!(connection.page_info.end_cursor, Some(Cursor::encode(10)));
}

#[tokio::test]
async fn test_last_page_of_25() {
    let connection = resolver(25)
        .resolve(None, &ConnectionArgs::new().last(10), &Context::new())
        .await
        .unwrap();

    assert_eq!(connection.cursor_ids(), (16..=25).collect::<Vec<_>>());
    assert!(connection.page_info.has_previous_page);
    assert!(!connection.page_info.has_next_page);
}

#[tokio::test]
async fn test_page_after_cursor() {
    let args = ConnectionArgs::new().first(10).after(Cursor::encode(10));
    let connection = resolver(25)
        .resolve(None, &args, &Context::new())
        .await
        .unwrap();

    assert_eq!(connection.cursor_ids(), (11..=20).collect::<Vec<_>>());
    assert!(connection.page_info.has_next_page);
}

#[tokio::test]
async fn test_backward_page_before_cursor_matches_forward_window() {
    let resolver = resolver(25);
    let ctx = Context::new();

    let backward = resolver
        .resolve(
            None,
            &ConnectionArgs::new().last(5).before(Cursor::encode(16)),
            &ctx,
        )
        .await
        .unwrap();
    let forward = resolver
        .resolve(
            None,
            &ConnectionArgs::new().first(5).after(Cursor::encode(10)),
            &ctx,
        )
        .await
        .unwrap();

    assert_eq!(backward.cursor_ids(), vec![11, 12, 13, 14, 15]);
    assert_eq!(backward.edges, forward.edges);
    assert!(backward.page_info.has_previous_page);
}

#[tokio::test]
async fn test_cursors_strictly_increase() {
    let connection = resolver(25)
        .resolve(None, &ConnectionArgs::new().first(25), &Context::new())
        .await
        .unwrap();

    let ids = connection.cursor_ids();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(
        connection.nodes,
        connection.edges.iter().map(|e| e.node.clone()).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_empty_scope() {
    let connection = resolver(25)
        .resolve(Some(&99), &ConnectionArgs::new().first(10), &Context::new())
        .await
        .unwrap();

    assert!(connection.edges.is_empty());
    assert!(connection.nodes.is_empty());
    assert!(!connection.page_info.has_next_page);
    assert!(!connection.page_info.has_previous_page);
    assert!(connection.page_info.start_cursor.is_none());
    assert!(connection.page_info.end_cursor.is_none());
}

#[tokio::test]
async fn test_exact_page() {
    let connection = resolver(10)
        .resolve(None, &ConnectionArgs::new().first(10), &Context::new())
        .await
        .unwrap();

    assert_eq!(connection.len(), 10);
    assert!(!connection.page_info.has_next_page);
}

#[tokio::test]
async fn test_relation_ordering_without_list_never_executes() {
    let resolver = resolver(25);
    let args = ConnectionArgs::new().first(10).filter("orderby", json!("IN"));

    let err = resolver.resolve(None, &args, &Context::new()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert_eq!(err.field(), Some("orderby"));
    assert_eq!(resolver.kind().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_relation_ordering_with_list() {
    let args = ConnectionArgs::new()
        .first(10)
        .filter("orderby", json!("IN"))
        .filter("in", json!([4, 2, 9]));

    let connection = resolver(25)
        .resolve(None, &args, &Context::new())
        .await
        .unwrap();
    assert_eq!(connection.cursor_ids(), vec![2, 4, 9]);
}

#[tokio::test]
async fn test_malformed_cursor_never_executes() {
    let resolver = resolver(25);
    let args = ConnectionArgs::new().first(10).after(Cursor::from_raw("not-a-cursor"));

    let err = resolver.resolve(None, &args, &Context::new()).await.unwrap_err();

    assert!(matches!(err, ConnectionError::MalformedCursor { .. }));
    assert_eq!(resolver.kind().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backend_failure_propagates() {
    let mut kind = SpyKind::new(items(3));
    kind.fail = true;
    let err = ConnectionResolver::new(kind)
        .resolve(None, &ConnectionArgs::new(), &Context::new())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::BackendQueryFailure);
}

#[tokio::test]
async fn test_scope_cannot_be_widened() {
    let mut all = items(5);
    all.extend((6..=8).map(|id| Item { id, group: 2 }));
    let resolver = ConnectionResolver::new(SpyKind::new(all));

    let args = ConnectionArgs::new().first(10).filter("group", json!(1));
    let connection = resolver.resolve(Some(&2), &args, &Context::new()).await.unwrap();

    assert_eq!(connection.cursor_ids(), vec![6, 7, 8]);
    assert!(connection.nodes.iter().all(|item| item.group == 2));
}

#[derive(Clone)]
struct HiddenIds(Vec<u64>);

#[tokio::test]
async fn test_hooks_see_context_and_source() {
    let resolver = resolver(25).hook(|mut native: FilterMap, input: &HookInput<'_, u64>| {
        let hidden = input
            .context
            .get::<HiddenIds>()
            .map(|h| h.0.clone())
            .unwrap_or_default();
        let visible: Vec<u64> = (1..=25).filter(|id| !hidden.contains(id)).collect();
        native.insert("id__in".into(), json!(visible));
        assert!(input.source.is_none());
        Ok(native)
    });

    let mut data = TypedContext::new();
    data.insert(HiddenIds(vec![1, 3]));
    let ctx = Context::new().with_data(data);

    let connection = resolver
        .resolve(None, &ConnectionArgs::new().first(3), &ctx)
        .await
        .unwrap();
    assert_eq!(connection.cursor_ids(), vec![2, 4, 5]);
}

#[tokio::test]
async fn test_resolver_config_overrides_context() {
    let resolver = resolver(25).config(ConnectionConfig::new().max_page_size(4));
    let connection = resolver
        .resolve(None, &ConnectionArgs::new().first(10), &Context::new())
        .await
        .unwrap();

    assert_eq!(connection.len(), 4);
    assert!(connection.page_info.has_next_page);
}

#[tokio::test]
async fn test_context_default_page_size() {
    let ctx = Context::with_config(Arc::new(ConnectionConfig::new().default_page_size(3)));
    let connection = resolver(25)
        .resolve(None, &ConnectionArgs::new(), &ctx)
        .await
        .unwrap();

    assert_eq!(connection.cursor_ids(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unbounded_page_size_does_not_overflow() {
    let resolver = resolver(3).config(ConnectionConfig::new().max_page_size(usize::MAX));
    let connection = resolver
        .resolve(None, &ConnectionArgs::new().first(usize::MAX), &Context::new())
        .await
        .unwrap();

    assert_eq!(connection.cursor_ids(), vec![1, 2, 3]);
    assert!(!connection.page_info.has_next_page);
}

#[tokio::test]
async fn test_resolve_raw_arguments() {
    let connection = resolver(25)
        .resolve_value(
            None,
            json!({ "last": 2, "before": Cursor::encode(3).as_str() }),
            &Context::new(),
        )
        .await
        .unwrap();

    assert_eq!(connection.cursor_ids(), vec![1, 2]);
    assert!(!connection.page_info.has_previous_page);
}
