use chrono::{DateTime, Utc};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// The sender of an inbound chat update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    /// Platform user id.
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_bot: bool,
    pub username: Option<String>,
}

/// A stored user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub platform_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_bot: bool,
    pub username: Option<String>,
    /// Total prompt tokens spent on this user's drafts.
    pub prompt_tokens: u64,
    /// Total completion tokens spent on this user's drafts.
    pub completion_tokens: u64,
}

/// A stored event: one free-text note submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub platform_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A generated multi-platform post draft, with the token usage it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}
