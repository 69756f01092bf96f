//! Executes planned queries over in-memory tables.
//!
//! Every entity kind filters its table with its own native arguments and then
//! hands the candidates to `paginate`, which applies the keyset bounds, the
//! fetch order and the requested count.

use chrono::{DateTime, Utc};
use pressgql_connection::{Compare, Node, OrderField, QuerySpec, SortOrder};
use pressgql_core::{BackendError, FilterMap};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::trace;

/// A comparable sort key value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Int(i64),
    Uint(u64),
    /// Compared case-insensitively.
    Text(String),
    Date(DateTime<Utc>),
}

impl SortValue {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_lowercase())
    }

    /// Position of `item` in a relation list, if present.
    pub fn position<T: PartialEq>(list: Option<&[T]>, item: &T) -> Option<Self> {
        list.and_then(|items| items.iter().position(|i| i == item))
            .map(|p| Self::Uint(p as u64))
    }
}

/// A row that can be ordered by the fields its kind declares.
pub trait Record: Node {
    /// Sort key of this row for `field`, or `None` if the row has none.
    fn sort_value(&self, field: &OrderField, args: &NativeArgs<'_>) -> Option<SortValue>;
}

type Key = (SortValue, u64);

fn key_of<T: Record>(row: &T, spec: &QuerySpec, args: &NativeArgs<'_>) -> Option<Key> {
    if spec.orders_by_id() {
        return Some((SortValue::Uint(row.cursor_id()), row.cursor_id()));
    }
    row.sort_value(&spec.order_by, args)
        .map(|value| (value, row.cursor_id()))
}

/// Applies bounds, order and count to the filtered candidates.
///
/// `table` is the whole unfiltered table; cursor anchors are looked up there
/// so a cursor stays valid even if its row no longer matches the filters.
/// A cursor whose row is gone entirely has no sort value to compare against
/// and fails with a [`BackendError`]. Id orderings compare the decoded id
/// directly and accept such cursors.
pub fn paginate<T: Record>(
    entity: &str,
    candidates: Vec<T>,
    table: &[T],
    spec: &QuerySpec,
) -> Result<Vec<T>, BackendError> {
    let args = NativeArgs::new(&spec.native_args);

    let mut anchors = Vec::with_capacity(spec.bounds.len());
    for bound in &spec.bounds {
        let anchor = if spec.orders_by_id() {
            (SortValue::Uint(bound.id), bound.id)
        } else {
            table
                .iter()
                .find(|row| row.cursor_id() == bound.id)
                .and_then(|row| key_of(row, spec, &args))
                .ok_or_else(|| {
                    BackendError::new(entity, format!("cursor anchor {} not found", bound.id))
                })?
        };
        anchors.push((anchor, bound.compare));
    }

    let mut keyed = Vec::with_capacity(candidates.len());
    for row in candidates {
        let key = key_of(&row, spec, &args).ok_or_else(|| {
            BackendError::new(
                entity,
                format!("row {} has no `{}` sort key", row.cursor_id(), spec.order_by.native),
            )
        })?;
        let within = anchors.iter().all(|(anchor, compare)| match compare {
            Compare::Greater => key.cmp(anchor) == Ordering::Greater,
            Compare::Less => key.cmp(anchor) == Ordering::Less,
        });
        if within {
            keyed.push((key, row));
        }
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    if spec.order == SortOrder::Desc {
        keyed.reverse();
    }
    keyed.truncate(spec.requested_count);
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

/// Typed access to native query arguments.
#[derive(Debug, Clone, Copy)]
pub struct NativeArgs<'a>(&'a FilterMap);

impl<'a> NativeArgs<'a> {
    pub fn new(args: &'a FilterMap) -> Self {
        Self(args)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(as_id)
    }

    pub fn i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// A single id or a list of ids.
    pub fn ids(&self, key: &str) -> Option<Vec<u64>> {
        match self.get(key)? {
            Value::Array(items) => Some(items.iter().filter_map(as_id).collect()),
            other => as_id(other).map(|id| vec![id]),
        }
    }

    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    /// A single string or a list of strings.
    pub fn strs(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            Value::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Logs native keys this executor does not understand.
    pub fn trace_unknown(&self, entity: &str, known: &[&str]) {
        for key in self.0.keys().filter(|k| !known.contains(&k.as_str())) {
            trace!(entity, key = key.as_str(), "ignoring unsupported query argument");
        }
    }
}

fn as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Case-insensitive substring match.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Returns true when `list` is absent or contains `item`.
pub fn allowed<T: PartialEq>(list: Option<&Vec<T>>, item: &T) -> bool {
    list.map_or(true, |items| items.contains(item))
}

/// Returns true when `list` is absent or does not contain `item`.
pub fn not_excluded<T: PartialEq>(list: Option<&Vec<T>>, item: &T) -> bool {
    list.map_or(true, |items| !items.contains(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressgql_connection::{CursorBound, Scope};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u64,
        name: &'static str,
    }

    impl Node for Row {
        fn cursor_id(&self) -> u64 {
            self.id
        }
    }

    impl Record for Row {
        fn sort_value(&self, field: &OrderField, args: &NativeArgs<'_>) -> Option<SortValue> {
            match field.native {
                "name" => Some(SortValue::text(self.name)),
                "in" => SortValue::position(args.ids("in").as_deref(), &self.id),
                _ => None,
            }
        }
    }

    const NAME: OrderField = OrderField::new("NAME", "name");

    fn table() -> Vec<Row> {
        vec![
            Row { id: 1, name: "delta" },
            Row { id: 2, name: "alpha" },
            Row { id: 3, name: "Charlie" },
            Row { id: 4, name: "bravo" },
            Row { id: 5, name: "alpha" },
        ]
    }

    fn spec(order: SortOrder, order_by: OrderField, bounds: Vec<CursorBound>) -> QuerySpec {
        QuerySpec {
            requested_count: 3,
            page_size: 2,
            order,
            order_by,
            bounds,
            scope: Scope::none(),
            native_args: FilterMap::new(),
        }
    }

    fn ids(rows: &[Row]) -> Vec<u64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_orders_by_text_with_id_tiebreak() {
        let query = spec(SortOrder::Asc, NAME, vec![]);
        let rows = paginate("rows", table(), &table(), &query).unwrap();
        assert_eq!(ids(&rows), vec![2, 5, 4]);
    }

    #[test]
    fn test_keyset_bound_on_duplicate_values() {
        let bound = CursorBound {
            id: 2,
            compare: Compare::Greater,
        };
        let query = spec(SortOrder::Asc, NAME, vec![bound]);
        let rows = paginate("rows", table(), &table(), &query).unwrap();
        assert_eq!(ids(&rows), vec![5, 4, 3]);
    }

    #[test]
    fn test_descending_fetch() {
        let query = spec(SortOrder::Desc, NAME, vec![]);
        let rows = paginate("rows", table(), &table(), &query).unwrap();
        assert_eq!(ids(&rows), vec![1, 3, 4]);
    }

    #[test]
    fn test_id_ordering_needs_no_anchor() {
        let bound = CursorBound {
            id: 99,
            compare: Compare::Less,
        };
        let by_id = OrderField::new("ID", "id");
        let query = spec(SortOrder::Desc, by_id, vec![bound]);
        let rows = paginate("rows", table(), &[], &query).unwrap();
        assert_eq!(ids(&rows), vec![5, 4, 3]);
    }

    #[test]
    fn test_missing_anchor_is_a_backend_error() {
        let bound = CursorBound {
            id: 99,
            compare: Compare::Greater,
        };
        let query = spec(SortOrder::Asc, NAME, vec![bound]);
        let err = paginate("rows", table(), &table(), &query).unwrap_err();
        assert_eq!(err.message, "cursor anchor 99 not found");
    }

    #[test]
    fn test_relation_list_position() {
        let mut spec = spec(SortOrder::Asc, OrderField::new("IN", "in").requires("in"), vec![]);
        spec.native_args.insert("in".into(), json!([4, 1, 3]));
        let candidates: Vec<Row> = table()
            .into_iter()
            .filter(|r| [4, 1, 3].contains(&r.id))
            .collect();
        let rows = paginate("rows", candidates, &table(), &spec).unwrap();
        assert_eq!(ids(&rows), vec![4, 1, 3]);
    }

    #[test]
    fn test_native_args_accessors() {
        let map: FilterMap = [
            ("one".to_string(), json!(4)),
            ("many".to_string(), json!([1, "2", "x"])),
            ("name".to_string(), json!("alpha")),
            ("none".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        let args = NativeArgs::new(&map);
        assert_eq!(args.ids("one"), Some(vec![4]));
        assert_eq!(args.ids("many"), Some(vec![1, 2]));
        assert_eq!(args.strs("name"), Some(vec!["alpha".to_string()]));
        assert!(args.get("none").is_none());
    }
}
