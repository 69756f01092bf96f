//! In-memory content store.
//!
//! Stands in for the relational database behind the entity kinds. Tables are
//! shared behind `RwLock`s so any number of resolutions can read concurrently.

use crate::entities::{Comment, Post, Term, User};
use chrono::{DateTime, Duration, Utc};
use pressgql_core::BackendError;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard};

#[derive(Debug)]
pub struct ContentStore {
    users: RwLock<Vec<User>>,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
    terms: RwLock<Vec<Term>>,
    available: AtomicBool,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::from_rows(Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    /// Creates a store from pre-built tables.
    pub fn from_rows(
        users: Vec<User>,
        posts: Vec<Post>,
        comments: Vec<Comment>,
        terms: Vec<Term>,
    ) -> Self {
        Self {
            users: RwLock::new(users),
            posts: RwLock::new(posts),
            comments: RwLock::new(comments),
            terms: RwLock::new(terms),
            available: AtomicBool::new(true),
        }
    }

    /// A small blog: three authors, a category tree, tags, posts and a
    /// threaded discussion.
    pub fn with_seed_data() -> Self {
        let epoch = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default();
        let day = |n: i64| epoch + Duration::days(n);

        let users = vec![
            User::new(1, "alice", day(0)).with_roles(&["administrator"]),
            User::new(2, "bob", day(3)).with_roles(&["author"]),
            User::new(3, "carol", day(7)).with_roles(&["author", "editor"]),
            User::new(4, "dave", day(9)),
        ];

        let terms = vec![
            Term::new(1, "category", "News"),
            Term::new(2, "category", "Engineering"),
            Term::new(3, "category", "Rust")
                .with_parent(2)
                .with_description("Systems programming"),
            Term::new(4, "post_tag", "async"),
            Term::new(5, "post_tag", "relay"),
            Term::new(6, "category", "Uncategorized"),
        ];

        let posts = vec![
            Post::new(1, 1, "Welcome to the blog", day(10)).with_terms(&[1]),
            Post::new(2, 2, "Cursor pagination explained", day(12)).with_terms(&[2, 5]),
            Post::new(3, 3, "Async Rust in practice", day(15)).with_terms(&[3, 4]),
            Post::new(4, 2, "Keyset versus offset", day(18)).with_terms(&[2]),
            Post::new(5, 1, "Draft: roadmap", day(19))
                .with_status("draft")
                .with_terms(&[1, 5]),
            Post::new(6, 3, "Tokio RwLock patterns", day(21)).with_terms(&[3, 4]),
            Post::new(7, 1, "Release notes", day(24)).with_terms(&[1]),
            Post::new(8, 1, "Release notes: appendix", day(25)).with_parent(7),
        ];

        let comments = vec![
            Comment::new(1, 2, 3, day(12) + Duration::hours(1)).with_content("Great overview"),
            Comment::new(2, 2, 4, day(12) + Duration::hours(2))
                .reply_to(1)
                .with_content("Agreed"),
            Comment::new(3, 2, 2, day(12) + Duration::hours(3))
                .reply_to(1)
                .with_content("Thanks!"),
            Comment::new(4, 2, 0, day(13)).with_status("hold"),
            Comment::new(5, 3, 1, day(15) + Duration::hours(5)).with_content("Ship it"),
            Comment::new(6, 2, 3, day(14)).with_content("Follow-up question"),
        ];

        Self::from_rows(users, posts, comments, terms)
    }

    /// Simulates the database going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub(crate) fn ensure_available(&self, entity: &str) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::new(entity, "content store unavailable"))
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.push(user);
    }

    pub async fn insert_post(&self, post: Post) {
        self.posts.write().await.push(post);
    }

    pub async fn insert_comment(&self, comment: Comment) {
        self.comments.write().await.push(comment);
    }

    pub async fn insert_term(&self, term: Term) {
        self.terms.write().await.push(term);
    }

    pub(crate) async fn users(&self) -> RwLockReadGuard<'_, Vec<User>> {
        self.users.read().await
    }

    pub(crate) async fn posts(&self) -> RwLockReadGuard<'_, Vec<Post>> {
        self.posts.read().await
    }

    pub(crate) async fn comments(&self) -> RwLockReadGuard<'_, Vec<Comment>> {
        self.comments.read().await
    }

    pub(crate) async fn terms(&self) -> RwLockReadGuard<'_, Vec<Term>> {
        self.terms.read().await
    }
}
