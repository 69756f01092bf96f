//! Posts connection.

use crate::entities::{Post, Term, User};
use crate::query::{allowed, contains_ci, not_excluded, paginate, NativeArgs, Record, SortValue};
use crate::store::ContentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pressgql_connection::{
    EntityKind, FieldMapping, OrderField, QuerySpec, Scope, SortOrder, TranslationTable,
};
use pressgql_core::BackendError;
use std::sync::Arc;

const ENTITY: &str = "posts";

const DATE: OrderField = OrderField::new("DATE", "date");

const ORDER_FIELDS: &[OrderField] = &[
    DATE,
    OrderField::new("TITLE", "title"),
    OrderField::new("SLUG", "name"),
    OrderField::new("MENU_ORDER", "menu_order"),
    OrderField::new("AUTHOR", "author"),
    OrderField::new("PARENT", "post_parent"),
    OrderField::new("IN", "post__in").requires("post__in"),
    OrderField::new("NAME_IN", "post_name__in").requires("post_name__in"),
    OrderField::new("PARENT_IN", "post_parent__in").requires("post_parent__in"),
];

const TABLE: TranslationTable = TranslationTable::new(&[
    ("author", FieldMapping::Rename("author")),
    ("authorIn", FieldMapping::Rename("author__in")),
    ("authorNotIn", FieldMapping::Rename("author__not_in")),
    ("authorName", FieldMapping::Rename("author_name")),
    ("categoryId", FieldMapping::Rename("cat")),
    ("categoryIn", FieldMapping::Rename("category__in")),
    ("tagId", FieldMapping::Rename("tag_id")),
    ("tagIn", FieldMapping::Rename("tag__in")),
    ("search", FieldMapping::Rename("s")),
    ("id", FieldMapping::Rename("p")),
    ("in", FieldMapping::Rename("post__in")),
    ("notIn", FieldMapping::Rename("post__not_in")),
    ("name", FieldMapping::Rename("name")),
    ("nameIn", FieldMapping::Rename("post_name__in")),
    ("parent", FieldMapping::Rename("post_parent")),
    ("parentIn", FieldMapping::Rename("post_parent__in")),
    ("parentNotIn", FieldMapping::Rename("post_parent__not_in")),
    ("status", FieldMapping::Rename("post_status")),
    ("stati", FieldMapping::Rename("post_status")),
    ("title", FieldMapping::Rename("title")),
    ("hasPassword", FieldMapping::Rename("has_password")),
    ("password", FieldMapping::Rename("post_password")),
    ("contentTypes", FieldMapping::Rename("post_type")),
    ("dateQuery", FieldMapping::Rename("date_query")),
    ("mimeType", FieldMapping::Drop),
]);

const KNOWN: &[&str] = &[
    "author",
    "author__in",
    "author__not_in",
    "author_name",
    "cat",
    "category__in",
    "tag_id",
    "tag__in",
    "term_id",
    "s",
    "p",
    "post__in",
    "post__not_in",
    "name",
    "post_name__in",
    "post_parent",
    "post_parent__in",
    "post_parent__not_in",
    "post_status",
    "title",
    "has_password",
    "post_password",
    "post_type",
    "date_query",
];

/// What a posts connection can hang off of.
#[derive(Debug, Clone)]
pub enum PostSource {
    /// Posts written by a user.
    Author(User),
    /// Posts assigned a category or tag.
    Term(Term),
    /// Child posts of a post.
    Parent(Post),
}

/// Posts, newest first.
#[derive(Debug, Clone)]
pub struct PostKind {
    store: Arc<ContentStore>,
}

impl PostKind {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }
}

impl Record for Post {
    fn sort_value(&self, field: &OrderField, args: &NativeArgs<'_>) -> Option<SortValue> {
        match field.native {
            "date" => Some(SortValue::Date(self.date)),
            "title" => Some(SortValue::text(&self.title)),
            "name" => Some(SortValue::text(&self.name)),
            "menu_order" => Some(SortValue::Int(self.menu_order)),
            "author" => Some(SortValue::Uint(self.author_id)),
            "post_parent" => Some(SortValue::Uint(self.parent_id)),
            "post__in" => SortValue::position(args.ids("post__in").as_deref(), &self.id),
            "post_name__in" => {
                SortValue::position(args.strs("post_name__in").as_deref(), &self.name)
            }
            "post_parent__in" => {
                SortValue::position(args.ids("post_parent__in").as_deref(), &self.parent_id)
            }
            _ => None,
        }
    }
}

/// Parsed `date_query` bounds.
struct DateRange {
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
}

impl DateRange {
    fn from_args(args: &NativeArgs<'_>) -> Result<Option<Self>, BackendError> {
        let Some(query) = args.get("date_query") else {
            return Ok(None);
        };
        let parse = |key: &str| -> Result<Option<DateTime<Utc>>, BackendError> {
            match query.get(key).and_then(serde_json::Value::as_str) {
                None => Ok(None),
                Some(raw) => DateTime::parse_from_rfc3339(raw)
                    .map(|d| Some(d.with_timezone(&Utc)))
                    .map_err(|e| {
                        BackendError::new(ENTITY, format!("invalid date_query.{key}: {e}"))
                    }),
            }
        };
        Ok(Some(Self {
            after: parse("after")?,
            before: parse("before")?,
        }))
    }

    fn contains(&self, date: DateTime<Utc>) -> bool {
        self.after.map_or(true, |after| date > after)
            && self.before.map_or(true, |before| date < before)
    }
}

fn has_any_term(post: &Post, terms: Option<&Vec<u64>>) -> bool {
    terms.map_or(true, |terms| post.term_ids.iter().any(|t| terms.contains(t)))
}

fn has_term(post: &Post, term: Option<u64>) -> bool {
    term.map_or(true, |term| post.term_ids.contains(&term))
}

#[async_trait]
impl EntityKind for PostKind {
    type Source = PostSource;
    type Node = Post;

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
        (DATE, SortOrder::Desc)
    }

    fn plan_scope(&self, source: Option<&PostSource>) -> Scope {
        match source {
            None => Scope::none(),
            Some(PostSource::Author(user)) => Scope::none().strict("author", user.id),
            Some(PostSource::Term(term)) => Scope::none().strict("term_id", term.id),
            Some(PostSource::Parent(post)) => Scope::none().strict("post_parent", post.id),
        }
    }

    async fn execute(&self, spec: &QuerySpec) -> Result<Vec<Post>, BackendError> {
        self.store.ensure_available(ENTITY)?;
        let args = NativeArgs::new(&spec.native_args);
        args.trace_unknown(ENTITY, KNOWN);

        let author_name_ids = match args.str("author_name") {
            None => None,
            Some(name) => Some(
                self.store
                    .users()
                    .await
                    .iter()
                    .filter(|u| u.nicename == name || u.login == name)
                    .map(|u| u.id)
                    .collect::<Vec<_>>(),
            ),
        };

        let author = args.u64("author");
        let author_in = args.ids("author__in");
        let author_not_in = args.ids("author__not_in");
        let cat = args.u64("cat");
        let tag = args.u64("tag_id");
        let term = args.u64("term_id");
        let category_in = args.ids("category__in");
        let tag_in = args.ids("tag__in");
        let search = args.str("s");
        let id = args.u64("p");
        let post_in = args.ids("post__in");
        let post_not_in = args.ids("post__not_in");
        let name = args.str("name");
        let name_in = args.strs("post_name__in");
        let parent = args.u64("post_parent");
        let parent_in = args.ids("post_parent__in");
        let parent_not_in = args.ids("post_parent__not_in");
        let statuses = args
            .strs("post_status")
            .unwrap_or_else(|| vec!["publish".to_string()]);
        let title = args.str("title");
        let has_password = args.bool("has_password");
        let password = args.str("post_password");
        let post_types = args.strs("post_type").unwrap_or_else(|| vec!["post".to_string()]);
        let dates = DateRange::from_args(&args)?;

        let posts = self.store.posts().await;
        let candidates: Vec<Post> = posts
            .iter()
            .filter(|p| statuses.iter().any(|s| s == "any" || *s == p.status))
            .filter(|p| post_types.contains(&p.post_type))
            .filter(|p| author.map_or(true, |a| p.author_id == a))
            .filter(|p| allowed(author_in.as_ref(), &p.author_id))
            .filter(|p| not_excluded(author_not_in.as_ref(), &p.author_id))
            .filter(|p| allowed(author_name_ids.as_ref(), &p.author_id))
            .filter(|p| has_term(p, cat) && has_term(p, tag) && has_term(p, term))
            .filter(|p| {
                has_any_term(p, category_in.as_ref()) && has_any_term(p, tag_in.as_ref())
            })
            .filter(|p| {
                search.map_or(true, |s| contains_ci(&p.title, s) || contains_ci(&p.content, s))
            })
            .filter(|p| id.map_or(true, |id| p.id == id))
            .filter(|p| allowed(post_in.as_ref(), &p.id))
            .filter(|p| not_excluded(post_not_in.as_ref(), &p.id))
            .filter(|p| name.map_or(true, |n| p.name == n))
            .filter(|p| allowed(name_in.as_ref(), &p.name))
            .filter(|p| parent.map_or(true, |parent| p.parent_id == parent))
            .filter(|p| allowed(parent_in.as_ref(), &p.parent_id))
            .filter(|p| not_excluded(parent_not_in.as_ref(), &p.parent_id))
            .filter(|p| title.map_or(true, |t| p.title == t))
            .filter(|p| has_password.map_or(true, |wanted| p.password.is_some() == wanted))
            .filter(|p| password.map_or(true, |pw| p.password.as_deref() == Some(pw)))
            .filter(|p| dates.as_ref().map_or(true, |range| range.contains(p.date)))
            .cloned()
            .collect();

        paginate(ENTITY, candidates, &posts, spec)
    }
}
