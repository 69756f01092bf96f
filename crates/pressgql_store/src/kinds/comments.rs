//! Comments connection.

use crate::entities::{Comment, Post, User};
use crate::query::{allowed, contains_ci, not_excluded, paginate, NativeArgs, Record, SortValue};
use crate::store::ContentStore;
use async_trait::async_trait;
use pressgql_connection::{
    EntityKind, FieldMapping, OrderField, QuerySpec, Scope, SortOrder, TranslationTable,
};
use pressgql_core::BackendError;
use std::sync::Arc;

const ENTITY: &str = "comments";

const COMMENT_DATE: OrderField = OrderField::new("COMMENT_DATE", "comment_date");

const ORDER_FIELDS: &[OrderField] = &[
    COMMENT_DATE,
    OrderField::new("COMMENT_ID", "id"),
    OrderField::new("COMMENT_KARMA", "comment_karma"),
    OrderField::new("COMMENT_AUTHOR", "comment_author"),
    OrderField::new("COMMENT_POST_ID", "comment_post_ID"),
    OrderField::new("COMMENT_PARENT", "comment_parent"),
    OrderField::new("COMMENT_IN", "comment__in").requires("comment__in"),
];

const TABLE: TranslationTable = TranslationTable::new(&[
    ("authorEmail", FieldMapping::Rename("author_email")),
    ("authorIn", FieldMapping::Rename("author__in")),
    ("authorNotIn", FieldMapping::Rename("author__not_in")),
    ("commentIn", FieldMapping::Rename("comment__in")),
    ("commentNotIn", FieldMapping::Rename("comment__not_in")),
    ("commentType", FieldMapping::Rename("type")),
    ("contentAuthor", FieldMapping::Rename("post_author")),
    ("contentId", FieldMapping::Rename("post_id")),
    ("contentIdIn", FieldMapping::Rename("post__in")),
    ("contentStatus", FieldMapping::Rename("post_status")),
    ("includeUnapproved", FieldMapping::Rename("include_unapproved")),
    ("karma", FieldMapping::Rename("karma")),
    ("parent", FieldMapping::Rename("parent")),
    ("parentIn", FieldMapping::Rename("parent__in")),
    ("parentNotIn", FieldMapping::Rename("parent__not_in")),
    ("search", FieldMapping::Rename("search")),
    ("status", FieldMapping::Rename("status")),
    ("userId", FieldMapping::Rename("user_id")),
]);

const KNOWN: &[&str] = &[
    "author_email",
    "author__in",
    "author__not_in",
    "comment__in",
    "comment__not_in",
    "type",
    "post_author",
    "post_id",
    "post__in",
    "post_status",
    "include_unapproved",
    "karma",
    "parent",
    "parent__in",
    "parent__not_in",
    "search",
    "status",
    "user_id",
];

/// What a comments connection can hang off of.
#[derive(Debug, Clone)]
pub enum CommentSource {
    /// Top-level comments on a post, unless the client asks for specific parents.
    Post(Post),
    /// Direct replies to a comment.
    Replies(Comment),
    /// Comments written by a user.
    Author(User),
}

/// Comments, oldest first.
#[derive(Debug, Clone)]
pub struct CommentKind {
    store: Arc<ContentStore>,
}

impl CommentKind {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }
}

impl Record for Comment {
    fn sort_value(&self, field: &OrderField, args: &NativeArgs<'_>) -> Option<SortValue> {
        match field.native {
            "comment_date" => Some(SortValue::Date(self.date)),
            "comment_karma" => Some(SortValue::Int(self.karma)),
            "comment_author" => Some(SortValue::text(&self.author_name)),
            "comment_post_ID" => Some(SortValue::Uint(self.post_id)),
            "comment_parent" => Some(SortValue::Uint(self.parent_id)),
            "comment__in" => SortValue::position(args.ids("comment__in").as_deref(), &self.id),
            _ => None,
        }
    }
}

#[async_trait]
impl EntityKind for CommentKind {
    type Source = CommentSource;
    type Node = Comment;

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
        (COMMENT_DATE, SortOrder::Asc)
    }

    fn plan_scope(&self, source: Option<&CommentSource>) -> Scope {
        match source {
            None => Scope::none(),
            Some(CommentSource::Post(post)) => Scope::none()
                .strict("post_id", post.id)
                .soft("parent", 0, &["parent__in"]),
            Some(CommentSource::Replies(comment)) => Scope::none().strict("parent", comment.id),
            Some(CommentSource::Author(user)) => Scope::none().strict("user_id", user.id),
        }
    }

    async fn execute(&self, spec: &QuerySpec) -> Result<Vec<Comment>, BackendError> {
        self.store.ensure_available(ENTITY)?;
        let args = NativeArgs::new(&spec.native_args);
        args.trace_unknown(ENTITY, KNOWN);

        // Post-level filters resolve to the set of eligible post ids.
        let post_author = args.ids("post_author");
        let post_status = args.strs("post_status");
        let eligible_posts = if post_author.is_some() || post_status.is_some() {
            Some(
                self.store
                    .posts()
                    .await
                    .iter()
                    .filter(|p| allowed(post_author.as_ref(), &p.author_id))
                    .filter(|p| allowed(post_status.as_ref(), &p.status))
                    .map(|p| p.id)
                    .collect::<Vec<_>>(),
            )
        } else {
            None
        };

        let author_email = args.str("author_email");
        let author_in = args.ids("author__in");
        let author_not_in = args.ids("author__not_in");
        let comment_in = args.ids("comment__in");
        let comment_not_in = args.ids("comment__not_in");
        let comment_type = args.str("type");
        let post_id = args.u64("post_id");
        let post_in = args.ids("post__in");
        let karma = args.i64("karma");
        let parent = args.u64("parent");
        let parent_in = args.ids("parent__in");
        let parent_not_in = args.ids("parent__not_in");
        let search = args.str("search");
        let user_id = args.u64("user_id");
        let statuses = args
            .strs("status")
            .unwrap_or_else(|| vec!["approve".to_string()]);
        // Unapproved comments by these users (or emails) are shown anyway.
        let unapproved_ids = args.ids("include_unapproved").unwrap_or_default();
        let unapproved_emails = args.strs("include_unapproved").unwrap_or_default();

        let comments = self.store.comments().await;
        let candidates: Vec<Comment> = comments
            .iter()
            .filter(|c| {
                statuses.iter().any(|s| s == "all" || *s == c.status)
                    || (c.status == "hold"
                        && (unapproved_ids.contains(&c.user_id)
                            || unapproved_emails.contains(&c.author_email)))
            })
            .filter(|c| author_email.map_or(true, |email| c.author_email == email))
            .filter(|c| allowed(author_in.as_ref(), &c.user_id))
            .filter(|c| not_excluded(author_not_in.as_ref(), &c.user_id))
            .filter(|c| allowed(comment_in.as_ref(), &c.id))
            .filter(|c| not_excluded(comment_not_in.as_ref(), &c.id))
            .filter(|c| comment_type.map_or(true, |t| c.comment_type == t))
            .filter(|c| post_id.map_or(true, |id| c.post_id == id))
            .filter(|c| allowed(post_in.as_ref(), &c.post_id))
            .filter(|c| allowed(eligible_posts.as_ref(), &c.post_id))
            .filter(|c| karma.map_or(true, |k| c.karma == k))
            .filter(|c| parent.map_or(true, |p| c.parent_id == p))
            .filter(|c| allowed(parent_in.as_ref(), &c.parent_id))
            .filter(|c| not_excluded(parent_not_in.as_ref(), &c.parent_id))
            .filter(|c| {
                search.map_or(true, |s| {
                    contains_ci(&c.content, s)
                        || contains_ci(&c.author_name, s)
                        || contains_ci(&c.author_email, s)
                })
            })
            .filter(|c| user_id.map_or(true, |id| c.user_id == id))
            .cloned()
            .collect();

        paginate(ENTITY, candidates, &comments, spec)
    }
}
