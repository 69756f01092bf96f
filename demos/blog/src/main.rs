//! pressgql blog demo
//!
//! Resolves a few connections over the seeded content store and prints them
//! as JSON, the way a GraphQL layer would hand them to a client.
//!
//! # Running
//! ```bash
//! RUST_LOG=pressgql_connection=debug cargo run -p pressgql-blog-demo
//! ```

use chrono::Utc;
use pressgql_connection::{
    Connection, ConnectionArgs, ConnectionResolver, Context, FilterMap, HookInput,
};
use pressgql_core::{ConnectionError, TypedContext};
use pressgql_store::{
    CommentKind, CommentSource, ContentStore, Post, PostKind, PostSource, Term, TermKind,
    TermSource, UserKind,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// The user making the request.
#[derive(Debug, Clone)]
struct Viewer {
    can_read_drafts: bool,
}

/// Only editors may list unpublished posts.
fn published_only(
    mut native: FilterMap,
    input: &HookInput<'_, PostSource>,
) -> Result<FilterMap, ConnectionError> {
    let allowed = input.context.get::<Viewer>().is_some_and(|v| v.can_read_drafts);
    if !allowed && native.contains_key("post_status") {
        native.insert("post_status".into(), json!("publish"));
    }
    Ok(native)
}

fn print<T: Serialize>(label: &str, connection: &Connection<T>) -> Result<(), Box<dyn Error>> {
    println!("# {label}\n{}\n", serde_json::to_string_pretty(connection)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pressgql_connection=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let store = Arc::new(ContentStore::with_seed_data());
    info!("Content store seeded");

    let mut data = TypedContext::new();
    data.insert(Viewer { can_read_drafts: false });
    let ctx = Context::new().with_data(data);

    // Posts, two at a time, following endCursor.
    let posts = ConnectionResolver::new(PostKind::new(store.clone())).hook(published_only);
    let mut args = ConnectionArgs::new().first(2).filter("status", json!("draft"));
    loop {
        let page = posts.resolve(None, &args, &ctx).await?;
        print("posts", &page)?;
        match (page.page_info.has_next_page, page.page_info.end_cursor) {
            (true, Some(cursor)) => args = args.after(cursor),
            _ => break,
        }
    }

    // Top-level comments of a post, then the replies to its first comment.
    let comments = ConnectionResolver::new(CommentKind::new(store.clone()));
    let post = Post::new(2, 2, "Cursor pagination explained", Utc::now());
    let top = comments
        .resolve(Some(&CommentSource::Post(post)), &ConnectionArgs::new(), &ctx)
        .await?;
    print("comments on post 2", &top)?;
    if let Some(first) = top.nodes.first() {
        let replies = comments
            .resolve(Some(&CommentSource::Replies(first.clone())), &ConnectionArgs::new(), &ctx)
            .await?;
        print("replies", &replies)?;
    }

    // Categories of a post, and the children of a category.
    let categories = ConnectionResolver::new(TermKind::new(store.clone(), "category"));
    let post = Post::new(3, 3, "Async Rust in practice", Utc::now());
    let assigned = categories
        .resolve(Some(&TermSource::Post(post)), &ConnectionArgs::new(), &ctx)
        .await?;
    print("categories of post 3", &assigned)?;
    if let Some(category) = assigned.nodes.first() {
        if category.parent_id != 0 {
            let siblings = categories
                .resolve_value(
                    Some(&TermSource::Children(Term::new(
                        category.parent_id,
                        "category",
                        "parent",
                    ))),
                    json!({ "first": 5 }),
                    &ctx,
                )
                .await?;
            print("sibling categories", &siblings)?;
        }
    }

    // Users in the order of a login list, straight from raw arguments.
    let users = ConnectionResolver::new(UserKind::new(store.clone()));
    let raw: Value = json!({
        "first": 3,
        "where": { "orderby": "LOGIN_IN", "loginIn": ["carol", "alice", "bob"] }
    });
    let ordered = users.resolve_value(None, raw, &ctx).await?;
    print("users", &ordered)?;

    // Posts by the first of them.
    if let Some(author) = ordered.nodes.first() {
        let by_author = posts
            .resolve(
                Some(&PostSource::Author(author.clone())),
                &ConnectionArgs::new().last(1),
                &ctx,
            )
            .await?;
        print(&format!("oldest post by {}", author.login), &by_author)?;
    }

    // A relation ordering without its list is rejected before any query runs.
    let err = users
        .resolve(None, &ConnectionArgs::new().filter("orderby", json!("INCLUDE")), &ctx)
        .await;
    if let Err(err) = err {
        println!("# rejected\n{}", serde_json::to_string_pretty(&err)?);
    }

    Ok(())
}
