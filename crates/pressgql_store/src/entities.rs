//! Content rows.

use chrono::{DateTime, Utc};
use pressgql_connection::Node;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub nicename: String,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub registered: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    /// URL slug (`post_name`).
    pub name: String,
    pub content: String,
    /// `publish`, `draft`, `private`, ...
    pub status: String,
    pub post_type: String,
    pub author_id: u64,
    /// 0 for top-level posts.
    pub parent_id: u64,
    pub menu_order: i64,
    pub password: Option<String>,
    pub term_ids: Vec<u64>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    /// 0 for anonymous commenters.
    pub user_id: u64,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    /// 0 for top-level comments.
    pub parent_id: u64,
    /// `approve`, `hold`, `spam` or `trash`.
    pub status: String,
    pub comment_type: String,
    pub karma: i64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    /// `category`, `post_tag`, ...
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// 0 for top-level terms.
    pub parent_id: u64,
    pub term_order: i64,
    /// Published posts carrying this term, filled in when terms are queried.
    #[serde(default)]
    pub count: u64,
}

impl Node for User {
    fn cursor_id(&self) -> u64 {
        self.id
    }
}

impl Node for Post {
    fn cursor_id(&self) -> u64 {
        self.id
    }
}

impl Node for Comment {
    fn cursor_id(&self) -> u64 {
        self.id
    }
}

impl Node for Term {
    fn cursor_id(&self) -> u64 {
        self.id
    }
}

impl User {
    /// Creates a subscriber whose nicename and display name derive from `login`.
    pub fn new(id: u64, login: impl Into<String>, registered: DateTime<Utc>) -> Self {
        let login = login.into();
        Self {
            id,
            nicename: login.to_lowercase(),
            display_name: login.clone(),
            email: format!("{}@example.com", login.to_lowercase()),
            login,
            roles: vec!["subscriber".to_string()],
            registered,
        }
    }

    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| (*r).to_string()).collect();
        self
    }
}

impl Post {
    /// Creates a published, top-level post.
    pub fn new(id: u64, author_id: u64, title: impl Into<String>, date: DateTime<Utc>) -> Self {
        let title = title.into();
        Self {
            id,
            name: slugify(&title),
            content: String::new(),
            title,
            status: "publish".to_string(),
            post_type: "post".to_string(),
            author_id,
            parent_id: 0,
            menu_order: 0,
            password: None,
            term_ids: Vec::new(),
            date,
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_terms(mut self, term_ids: &[u64]) -> Self {
        self.term_ids = term_ids.to_vec();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl Comment {
    /// Creates an approved top-level comment by a registered user.
    pub fn new(id: u64, post_id: u64, user_id: u64, date: DateTime<Utc>) -> Self {
        Self {
            id,
            post_id,
            user_id,
            author_name: format!("user{user_id}"),
            author_email: format!("user{user_id}@example.com"),
            content: String::new(),
            parent_id: 0,
            status: "approve".to_string(),
            comment_type: "comment".to_string(),
            karma: 0,
            date,
        }
    }

    pub fn reply_to(mut self, parent_id: u64) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl Term {
    pub fn new(id: u64, taxonomy: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            taxonomy: taxonomy.into(),
            slug: slugify(&name),
            name,
            description: String::new(),
            parent_id: 0,
            term_order: 0,
            count: 0,
        }
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
