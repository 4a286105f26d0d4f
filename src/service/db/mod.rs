pub mod surreal;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::base::types::{ChatUser, Event, Res, User, Void};

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines the user and event storage the bot needs. Implementing
/// this trait allows different database backends to be used with the bot.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets the user by platform id; or, creates it from the chat identity if it doesn't exist.
    ///
    /// An existing record is returned as stored: its fields are never overwritten.
    async fn upsert_user_if_absent(&self, user: &ChatUser) -> Res<User>;

    /// Gets the user by platform id.
    async fn get_user(&self, platform_id: i64) -> Res<Option<User>>;

    /// Atomically adds token usage to the user's counters.
    ///
    /// Fails if the user does not exist.
    async fn increment_user_tokens(&self, platform_id: i64, prompt_tokens: u64, completion_tokens: u64) -> Void;

    /// Stores a new event for the user, timestamped now.
    async fn create_event(&self, platform_id: i64, text: &str) -> Res<Event>;

    /// Gets the user's events created within `[start, end]`, oldest first.
    async fn get_events_in_range(&self, platform_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Res<Vec<Event>>;
}

// Structs.

/// Database client for the postmaster bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}
