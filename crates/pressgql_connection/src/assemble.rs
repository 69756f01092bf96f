//! Connection assembly.

use crate::kind::Node;
use pressgql_core::{ConnectionArgs, Cursor};
use serde::Serialize;

/// Pagination info of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub start_cursor: Option<Cursor>,
    pub end_cursor: Option<Cursor>,
}

/// A `(cursor, node)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge<T> {
    pub cursor: Cursor,
    pub node: T,
}

/// A paginated collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    /// Same rows and order as `edges[*].node`.
    pub nodes: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    /// A connection without edges.
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            nodes: Vec::new(),
            page_info: PageInfo::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Decoded row ids of the edges, in order.
    pub fn cursor_ids(&self) -> Vec<u64> {
        self.edges
            .iter()
            .filter_map(|edge| edge.cursor.decode().ok())
            .collect()
    }
}

/// Reshapes an over-fetched row set into a connection.
///
/// `page_size` is the pre-overfetch amount. A row set longer than it proves
/// that another page exists in the direction being walked; which flag that
/// sets depends only on whether `first` or `last` was supplied.
pub fn assemble<T: Node>(
    mut rows: Vec<T>,
    args: &ConnectionArgs,
    page_size: usize,
) -> Connection<T> {
    let has_more = rows.len() > page_size;
    rows.truncate(page_size);
    if args.is_backward() {
        rows.reverse();
    }

    let edges: Vec<Edge<T>> = rows
        .iter()
        .map(|row| Edge {
            cursor: Cursor::encode(row.cursor_id()),
            node: row.clone(),
        })
        .collect();

    Connection {
        page_info: PageInfo {
            has_previous_page: args.last.is_some() && has_more,
            has_next_page: args.first.is_some() && has_more,
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
        },
        edges,
        nodes: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Row(u64);

    impl Node for Row {
        fn cursor_id(&self) -> u64 {
            self.0
        }
    }

    fn rows(ids: impl IntoIterator<Item = u64>) -> Vec<Row> {
        ids.into_iter().map(Row).collect()
    }

    #[test]
    fn test_empty_row_set() {
        let connection = assemble::<Row>(Vec::new(), &ConnectionArgs::new().first(10), 10);
        assert_eq!(connection, Connection::empty());
        insta::assert_debug_snapshot!(connection.page_info, @r###"
        PageInfo {
            has_previous_page: false,
            has_next_page: false,
            start_cursor: None,
            end_cursor: None,
        }
        "###);
    }

    #[test]
    fn test_overfetch_sets_next_page() {
        let connection = assemble(rows(1..=11), &ConnectionArgs::new().first(10), 10);
        assert_eq!(connection.len(), 10);
        assert!(connection.page_info.has_next_page);
        assert!(!connection.page_info.has_previous_page);
        assert_eq!(connection.page_info.end_cursor, Some(Cursor::encode(10)));
    }

    #[test]
    fn test_exact_page_has_no_next() {
        let connection = assemble(rows(1..=10), &ConnectionArgs::new().first(10), 10);
        assert_eq!(connection.len(), 10);
        assert!(!connection.page_info.has_next_page);
    }

    #[test]
    fn test_backward_is_reversed_into_canonical_order() {
        // fetched from the far end: 25, 24, ..., 15
        let connection = assemble(rows((15..=25).rev()), &ConnectionArgs::new().last(10), 10);
        assert_eq!(connection.cursor_ids(), (16..=25).collect::<Vec<_>>());
        assert_eq!(connection.nodes, rows(16..=25));
        assert!(connection.page_info.has_previous_page);
        assert!(!connection.page_info.has_next_page);
        assert_eq!(connection.page_info.start_cursor, Some(Cursor::encode(16)));
    }

    #[test]
    fn test_no_count_arguments_reports_no_pages() {
        let connection = assemble(rows(1..=11), &ConnectionArgs::new(), 10);
        assert_eq!(connection.len(), 10);
        assert!(!connection.page_info.has_next_page);
        assert!(!connection.page_info.has_previous_page);
    }

    #[test]
    fn test_serializes_camel_case() {
        let connection = assemble(rows([3]), &ConnectionArgs::new().first(1), 1);
        let json = serde_json::to_value(&connection).unwrap();
        assert_eq!(json["pageInfo"]["hasNextPage"], false);
        assert_eq!(json["edges"][0]["cursor"], Cursor::encode(3).as_str());
        assert_eq!(json["nodes"][0], 3);
    }
}
