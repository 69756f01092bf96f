//! In-memory content store for pressgql.
//!
//! Provides the content tables (users, posts, comments and terms) and one
//! `EntityKind` per table, so connections over them can be resolved with a
//! `ConnectionResolver`:
//!
//! ```ignore
//! let store = Arc::new(ContentStore::with_seed_data());
//! let posts = ConnectionResolver::new(PostKind::new(store.clone()));
//! let page = posts.resolve(None, &ConnectionArgs::new().first(5), &Context::new()).await?;
//! ```

pub mod entities;
pub mod kinds;
pub mod query;
pub mod store;

pub use entities::{Comment, Post, Term, User};
pub use kinds::{CommentKind, CommentSource, PostKind, PostSource, TermKind, TermSource, UserKind};
pub use query::{NativeArgs, Record, SortValue};
pub use store::ContentStore;
