//! Entity kinds backed by the content store.

mod comments;
mod posts;
mod terms;
mod users;

pub use comments::{CommentKind, CommentSource};
pub use posts::{PostKind, PostSource};
pub use terms::{TermKind, TermSource};
pub use users::UserKind;
