//! Query planning.
//!
//! The planner turns pagination arguments and translated filters into exactly
//! one `QuerySpec`. It fetches one row more than the page size, always from the
//! end of the sequence the client is walking towards, so the assembler can tell
//! whether another page exists without a count query.

use crate::kind::{EntityKind, OrderField, Scope, SortOrder};
use pressgql_core::{
    ConnectionArgs, ConnectionConfig, ConnectionError, ConnectionResult, FilterMap,
};
use serde_json::Value;
use std::fmt;
use tracing::trace;

/// Native key carrying the requested ordering field.
pub const ORDERBY_KEY: &str = "orderby";
/// Native key carrying the requested sort direction.
pub const ORDER_KEY: &str = "order";

/// Keyset comparison against a cursor's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    /// Rows whose `(orderBy value, id)` is greater than the anchor's.
    Greater,
    /// Rows whose `(orderBy value, id)` is less than the anchor's.
    Less,
}

impl Compare {
    /// Comparison selecting rows that come after the anchor in `order`.
    pub const fn after(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Greater,
            SortOrder::Desc => Self::Less,
        }
    }

    /// Comparison selecting rows that come before the anchor in `order`.
    pub const fn before(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Less,
            SortOrder::Desc => Self::Greater,
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greater => f.write_str(">"),
            Self::Less => f.write_str("<"),
        }
    }
}

/// One cursor boundary of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorBound {
    /// Row id decoded from the cursor.
    pub id: u64,
    pub compare: Compare,
}

/// A complete backend query specification.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Rows to fetch, including the overfetch sentinel.
    pub requested_count: usize,
    /// Rows the client asked for.
    pub page_size: usize,
    /// Fetch order. Reversed relative to the client's order when paginating
    /// backward.
    pub order: SortOrder,
    pub order_by: OrderField,
    /// Every bound must hold for a row to be visited.
    pub bounds: Vec<CursorBound>,
    pub scope: Scope,
    /// Translated filters with the scope already injected.
    pub native_args: FilterMap,
}

impl QuerySpec {
    /// Gets a native argument.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.native_args.get(key)
    }

    /// Returns true if the bounds only compare ids.
    pub fn orders_by_id(&self) -> bool {
        self.order_by.native == "id"
    }
}

/// Builds `QuerySpec`s from connection arguments.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner<'a> {
    config: &'a ConnectionConfig,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(config: &'a ConnectionConfig) -> Self {
        Self { config }
    }

    /// Plans one query for `kind`.
    ///
    /// `native` holds the already translated (and hooked) filters.
    pub fn plan<K: EntityKind>(
        &self,
        kind: &K,
        args: &ConnectionArgs,
        mut native: FilterMap,
        source: Option<&K::Source>,
    ) -> ConnectionResult<QuerySpec> {
        let page_size = self.config.page_size(args.first, args.last);

        let (default_field, default_order) = kind.default_order();
        let (order_by, explicit_order) = take_ordering(kind, &mut native)?;
        let order_by = order_by.unwrap_or(default_field);
        // Relation-list orderings follow the list unless told otherwise.
        let canonical = explicit_order.unwrap_or(if order_by.is_relation() {
            SortOrder::Asc
        } else {
            default_order
        });
        let order = if args.is_backward() {
            canonical.reverse()
        } else {
            canonical
        };

        let scope = kind.plan_scope(source);
        scope.apply(&mut native);

        if let Some(list_key) = order_by.requires {
            if !has_list(&native, list_key) {
                return Err(ConnectionError::invalid_argument(
                    ORDERBY_KEY,
                    format!(
                        "ordering by {} requires a non-empty `{list_key}` list",
                        order_by.name
                    ),
                ));
            }
        }

        let mut bounds = Vec::with_capacity(2);
        if let Some(after) = &args.after {
            bounds.push(CursorBound {
                id: after.decode()?,
                compare: Compare::after(canonical),
            });
        }
        if let Some(before) = &args.before {
            bounds.push(CursorBound {
                id: before.decode()?,
                compare: Compare::before(canonical),
            });
        }

        let spec = QuerySpec {
            requested_count: self.config.fetch_size(args.first, args.last),
            page_size,
            order,
            order_by,
            bounds,
            scope,
            native_args: native,
        };
        trace!(
            entity = kind.name(),
            requested = spec.requested_count,
            order = %spec.order,
            order_by = spec.order_by.native,
            bounds = spec.bounds.len(),
            "planned connection query"
        );
        Ok(spec)
    }
}

/// Removes `orderby`/`order` from the native args and resolves them.
///
/// `orderby` is either an enum name or a list of `{ field, order }` objects of
/// which the first decides the ordering.
fn take_ordering<K: EntityKind>(
    kind: &K,
    native: &mut FilterMap,
) -> ConnectionResult<(Option<OrderField>, Option<SortOrder>)> {
    let mut order = match native.shift_remove(ORDER_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => Some(parse_order(&raw)?),
        Some(_) => {
            return Err(ConnectionError::invalid_argument(
                ORDER_KEY,
                "expected ASC or DESC",
            ))
        }
    };

    let field_name = match native.shift_remove(ORDERBY_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name),
        Some(Value::Array(items)) => match items.into_iter().next() {
            None => None,
            Some(Value::String(name)) => Some(name),
            Some(Value::Object(mut item)) => {
                if let Some(Value::String(raw)) = item.remove(ORDER_KEY) {
                    order = Some(parse_order(&raw)?);
                }
                match item.remove("field") {
                    Some(Value::String(name)) => Some(name),
                    _ => {
                        return Err(ConnectionError::invalid_argument(
                            ORDERBY_KEY,
                            "ordering entry is missing `field`",
                        ))
                    }
                }
            }
            Some(_) => {
                return Err(ConnectionError::invalid_argument(
                    ORDERBY_KEY,
                    "expected an ordering field name",
                ))
            }
        },
        Some(_) => {
            return Err(ConnectionError::invalid_argument(
                ORDERBY_KEY,
                "expected an ordering field name",
            ))
        }
    };

    let field = match field_name {
        None => None,
        Some(name) => Some(
            kind.order_fields()
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(&name))
                .copied()
                .ok_or_else(|| {
                    ConnectionError::invalid_argument(
                        ORDERBY_KEY,
                        format!("{} cannot be ordered by `{name}`", kind.name()),
                    )
                })?,
        ),
    };
    Ok((field, order))
}

fn parse_order(raw: &str) -> ConnectionResult<SortOrder> {
    SortOrder::parse(raw).ok_or_else(|| {
        ConnectionError::invalid_argument(ORDER_KEY, format!("unknown order `{raw}`"))
    })
}

fn has_list(native: &FilterMap, key: &str) -> bool {
    match native.get(key) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}
