//! Users connection.

use crate::entities::User;
use crate::query::{allowed, contains_ci, not_excluded, paginate, NativeArgs, Record, SortValue};
use crate::store::ContentStore;
use async_trait::async_trait;
use pressgql_connection::{
    EntityKind, FieldMapping, OrderField, QuerySpec, Scope, SortOrder, TranslationTable,
};
use pressgql_core::{BackendError, ConnectionError, ConnectionResult, FilterMap};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::sync::Arc;

const ENTITY: &str = "users";

const LOGIN: OrderField = OrderField::new("LOGIN", "login");

const ORDER_FIELDS: &[OrderField] = &[
    LOGIN,
    OrderField::new("NICENAME", "nicename"),
    OrderField::new("DISPLAY_NAME", "display_name"),
    OrderField::new("EMAIL", "email"),
    OrderField::new("REGISTERED", "registered"),
    OrderField::new("ID", "id"),
    OrderField::new("INCLUDE", "include").requires("include"),
    OrderField::new("LOGIN_IN", "login__in").requires("login__in"),
    OrderField::new("NICENAME_IN", "nicename__in").requires("nicename__in"),
];

const TABLE: TranslationTable = TranslationTable::new(&[
    ("role", FieldMapping::Rename("role")),
    ("roleIn", FieldMapping::Rename("role__in")),
    ("roleNotIn", FieldMapping::Rename("role__not_in")),
    ("include", FieldMapping::Rename("include")),
    ("exclude", FieldMapping::Rename("exclude")),
    ("search", FieldMapping::Rename("search")),
    ("searchColumns", FieldMapping::Rename("search_columns")),
    ("login", FieldMapping::Rename("login")),
    ("loginIn", FieldMapping::Rename("login__in")),
    ("loginNotIn", FieldMapping::Rename("login__not_in")),
    ("nicename", FieldMapping::Rename("nicename")),
    ("nicenameIn", FieldMapping::Rename("nicename__in")),
    ("nicenameNotIn", FieldMapping::Rename("nicename__not_in")),
    ("hasPublishedPosts", FieldMapping::Rename("has_published_posts")),
    ("email", FieldMapping::Drop),
]);

const KNOWN: &[&str] = &[
    "role",
    "role__in",
    "role__not_in",
    "include",
    "exclude",
    "search",
    "search_columns",
    "login",
    "login__in",
    "login__not_in",
    "nicename",
    "nicename__in",
    "nicename__not_in",
    "has_published_posts",
];

const SEARCH_COLUMNS: &[&str] = &["id", "login", "nicename", "email", "display_name"];

/// Users, by login. Users hang off nothing.
#[derive(Debug, Clone)]
pub struct UserKind {
    store: Arc<ContentStore>,
}

impl UserKind {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }
}

impl Record for User {
    fn sort_value(&self, field: &OrderField, args: &NativeArgs<'_>) -> Option<SortValue> {
        match field.native {
            "login" => Some(SortValue::text(&self.login)),
            "nicename" => Some(SortValue::text(&self.nicename)),
            "display_name" => Some(SortValue::text(&self.display_name)),
            "email" => Some(SortValue::text(&self.email)),
            "registered" => Some(SortValue::Date(self.registered)),
            "include" => SortValue::position(args.ids("include").as_deref(), &self.id),
            "login__in" => SortValue::position(args.strs("login__in").as_deref(), &self.login),
            "nicename__in" => {
                SortValue::position(args.strs("nicename__in").as_deref(), &self.nicename)
            }
            _ => None,
        }
    }
}

fn search_columns(native: &FilterMap) -> ConnectionResult<Option<Vec<String>>> {
    let Some(columns) = NativeArgs::new(native).strs("search_columns") else {
        return Ok(None);
    };
    let columns: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
    if let Some(unknown) = columns.iter().find(|c| !SEARCH_COLUMNS.contains(&c.as_str())) {
        return Err(ConnectionError::invalid_argument(
            "searchColumns",
            format!("unknown search column `{unknown}`"),
        ));
    }
    Ok(Some(columns))
}

fn matches_search(user: &User, needle: &str, columns: &[String]) -> bool {
    columns.iter().any(|column| match column.as_str() {
        "id" => user.id.to_string() == needle,
        "login" => contains_ci(&user.login, needle),
        "nicename" => contains_ci(&user.nicename, needle),
        "email" => contains_ci(&user.email, needle),
        "display_name" => contains_ci(&user.display_name, needle),
        _ => false,
    })
}

fn has_any_role(user: &User, roles: &[String]) -> bool {
    user.roles.iter().any(|r| roles.contains(r))
}

#[async_trait]
impl EntityKind for UserKind {
    type Source = ();
    type Node = User;

    fn name(&self) -> &'static str {
        ENTITY
    }

    fn translation_table(&self) -> &TranslationTable {
        &TABLE
    }

    fn order_fields(&self) -> &'static [OrderField] {
        ORDER_FIELDS
    }

    fn default_order(&self) -> (OrderField, SortOrder) {
        (LOGIN, SortOrder::Asc)
    }

    fn validate(&self, native: &FilterMap) -> ConnectionResult<()> {
        let has_search = native.get("search").is_some_and(|s| !s.is_null());
        if search_columns(native)?.is_some() && !has_search {
            return Err(ConnectionError::invalid_argument(
                "searchColumns",
                "searchColumns requires search",
            ));
        }
        Ok(())
    }

    fn plan_scope(&self, _source: Option<&()>) -> Scope {
        Scope::none()
    }

    async fn execute(&self, spec: &QuerySpec) -> Result<Vec<User>, BackendError> {
        self.store.ensure_available(ENTITY)?;
        let args = NativeArgs::new(&spec.native_args);
        args.trace_unknown(ENTITY, KNOWN);

        let columns = search_columns(&spec.native_args)
            .map_err(|e| BackendError::new(ENTITY, e.to_string()))?
            .unwrap_or_else(|| vec!["login".into(), "nicename".into(), "email".into()]);
        let search = args.str("search").map(|s| s.trim_matches('*'));

        let published_authors = match args.get("has_published_posts") {
            None | Some(Value::Bool(false)) => None,
            Some(value) => {
                let types: Option<Vec<String>> = match value {
                    Value::Bool(_) => None,
                    _ => args.strs("has_published_posts"),
                };
                Some(
                    self.store
                        .posts()
                        .await
                        .iter()
                        .filter(|p| p.status == "publish")
                        .filter(|p| allowed(types.as_ref(), &p.post_type))
                        .map(|p| p.author_id)
                        .collect::<FxHashSet<_>>(),
                )
            }
        };

        let role = args.str("role");
        let role_in = args.strs("role__in");
        let role_not_in = args.strs("role__not_in");
        let include = args.ids("include");
        let exclude = args.ids("exclude");
        let login = args.str("login");
        let login_in = args.strs("login__in");
        let login_not_in = args.strs("login__not_in");
        let nicename = args.str("nicename");
        let nicename_in = args.strs("nicename__in");
        let nicename_not_in = args.strs("nicename__not_in");

        let users = self.store.users().await;
        let candidates: Vec<User> = users
            .iter()
            .filter(|u| role.map_or(true, |r| u.roles.iter().any(|have| have == r)))
            .filter(|u| role_in.as_deref().map_or(true, |roles| has_any_role(u, roles)))
            .filter(|u| role_not_in.as_deref().map_or(true, |roles| !has_any_role(u, roles)))
            .filter(|u| allowed(include.as_ref(), &u.id))
            .filter(|u| not_excluded(exclude.as_ref(), &u.id))
            .filter(|u| search.map_or(true, |s| matches_search(u, s, &columns)))
            .filter(|u| login.map_or(true, |l| u.login == l))
            .filter(|u| allowed(login_in.as_ref(), &u.login))
            .filter(|u| not_excluded(login_not_in.as_ref(), &u.login))
            .filter(|u| nicename.map_or(true, |n| u.nicename == n))
            .filter(|u| allowed(nicename_in.as_ref(), &u.nicename))
            .filter(|u| not_excluded(nicename_not_in.as_ref(), &u.nicename))
            .filter(|u| published_authors.as_ref().map_or(true, |ids| ids.contains(&u.id)))
            .cloned()
            .collect();

        paginate(ENTITY, candidates, &users, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_search_columns_are_checked() {
        let mut native = FilterMap::new();
        native.insert("search_columns".into(), Value::from(vec!["login", "url"]));
        let err = search_columns(&native).unwrap_err();
        assert_eq!(err.field(), Some("searchColumns"));

        native.insert("search_columns".into(), Value::from(vec!["LOGIN", "email"]));
        assert_eq!(
            search_columns(&native).unwrap(),
            Some(vec!["login".to_string(), "email".to_string()])
        );
    }

    #[test]
    fn test_search_by_id_is_exact() {
        let user = User::new(12, "alice", Utc::now());
        let columns = vec!["id".to_string()];
        assert!(matches_search(&user, "12", &columns));
        assert!(!matches_search(&user, "1", &columns));
    }
}
