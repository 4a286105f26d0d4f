//! SurrealDB implementation for postmaster bot data storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    RecordId, Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument, warn};

use crate::base::{
    config::Config,
    types::{ChatUser, Event, Res, User, Void},
};

use super::{DbClient, GenericDbClient};

/// Table and index definitions applied on connect.
const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
DEFINE TABLE IF NOT EXISTS event SCHEMALESS;
DEFINE INDEX IF NOT EXISTS event_platform_created ON TABLE event FIELDS platform_id, created_at;
"#;

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connects to the configured SurrealDB endpoint.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let credentials = match (&config.db_username, &config.db_password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            (Some(_), None) | (None, Some(_)) => return Err(anyhow::anyhow!("Database username and password must be set together.")),
            (None, None) => None,
        };

        let client = SurrealDbClient::connect(&config.db_endpoint, &config.db_namespace, &config.db_database, credentials).await?;

        Ok(Self { inner: Arc::new(client) })
    }

    /// Creates a fresh in-memory database, for tests.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::connect("mem://", "postmaster", "test", None).await?;

        Ok(Self { inner: Arc::new(client) })
    }
}

// Records.

/// A user record in the database, keyed `user:<platform_id>`.
#[derive(Debug, Serialize, Deserialize)]
struct SurrealUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    platform_id: i64,
    first_name: String,
    last_name: Option<String>,
    is_bot: bool,
    username: Option<String>,
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl From<&ChatUser> for SurrealUser {
    fn from(user: &ChatUser) -> Self {
        Self {
            id: None,
            platform_id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_bot: user.is_bot,
            username: user.username.clone(),
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }
}

impl From<SurrealUser> for User {
    fn from(user: SurrealUser) -> Self {
        Self {
            platform_id: user.platform_id,
            first_name: user.first_name,
            last_name: user.last_name,
            is_bot: user.is_bot,
            username: user.username,
            prompt_tokens: user.prompt_tokens,
            completion_tokens: user.completion_tokens,
        }
    }
}

/// An event record in the database.
///
/// `created_at` is a fixed-width RFC 3339 UTC string, so lexical order is chronological order.
#[derive(Debug, Serialize, Deserialize)]
struct SurrealEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    platform_id: i64,
    text: String,
    created_at: String,
}

impl TryFrom<SurrealEvent> for Event {
    type Error = anyhow::Error;

    fn try_from(event: SurrealEvent) -> Res<Self> {
        Ok(Self {
            platform_id: event.platform_id,
            text: event.text,
            created_at: parse_timestamp(&event.created_at)?,
        })
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(timestamp: &str) -> Res<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(timestamp)?.with_timezone(&Utc))
}

// Specific implementations.

/// SurrealDB client implementation.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Connect, sign in (when credentials are given), select the namespace and database, and apply the schema.
    #[instrument(name = "SurrealDbClient::connect", skip(credentials))]
    pub async fn connect(endpoint: &str, namespace: &str, database: &str, credentials: Option<(&str, &str)>) -> Res<Self> {
        let db = any::connect(endpoint).await?;

        if let Some((username, password)) = credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(namespace).use_db(database).await?;

        db.query(SCHEMA).await?.check()?;

        info!("Database initialized successfully.");

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self, user), fields(platform_id = user.id))]
    async fn upsert_user_if_absent(&self, user: &ChatUser) -> Res<User> {
        if let Some(existing) = self.get_user(user.id).await? {
            return Ok(existing);
        }

        info!("User `{}` not found, creating a new one.", user.id);

        let created = self
            .db
            .query("CREATE type::thing('user', $platform_id) CONTENT $user")
            .bind(("platform_id", user.id))
            .bind(("user", SurrealUser::from(user)))
            .await
            .and_then(|mut response| response.take::<Option<SurrealUser>>(0));

        match created {
            Ok(Some(created)) => Ok(created.into()),
            Ok(None) => Err(anyhow::anyhow!("User `{}` was not returned after creation.", user.id)),
            Err(err) => {
                // Another update from the same user may have created the record first.
                warn!("Failed to create user `{}`, re-reading: {}", user.id, err);

                self.get_user(user.id).await?.ok_or_else(|| err.into())
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_user(&self, platform_id: i64) -> Res<Option<User>> {
        let user: Option<SurrealUser> = self.db.select(("user", platform_id)).await?;

        Ok(user.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn increment_user_tokens(&self, platform_id: i64, prompt_tokens: u64, completion_tokens: u64) -> Void {
        let mut response = self
            .db
            .query("UPDATE type::thing('user', $platform_id) SET prompt_tokens += $prompt_tokens, completion_tokens += $completion_tokens")
            .bind(("platform_id", platform_id))
            .bind(("prompt_tokens", prompt_tokens))
            .bind(("completion_tokens", completion_tokens))
            .await?;

        let updated: Option<SurrealUser> = response.take(0)?;

        if updated.is_none() {
            return Err(anyhow::anyhow!("User `{platform_id}` not found."));
        }

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn create_event(&self, platform_id: i64, text: &str) -> Res<Event> {
        let record = SurrealEvent {
            id: None,
            platform_id,
            text: text.to_string(),
            created_at: format_timestamp(&Utc::now()),
        };

        let mut response = self.db.query("CREATE event CONTENT $event").bind(("event", record)).await?;

        let created: Option<SurrealEvent> = response.take(0)?;

        created.ok_or_else(|| anyhow::anyhow!("Event for user `{platform_id}` was not returned after creation."))?.try_into()
    }

    #[instrument(skip(self))]
    async fn get_events_in_range(&self, platform_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Res<Vec<Event>> {
        let mut response = self
            .db
            .query("SELECT * FROM event WHERE platform_id = $platform_id AND created_at >= $start AND created_at <= $end ORDER BY created_at ASC")
            .bind(("platform_id", platform_id))
            .bind(("start", format_timestamp(&start)))
            .bind(("end", format_timestamp(&end)))
            .await?;

        let events: Vec<SurrealEvent> = response.take(0)?;

        events.into_iter().map(Event::try_from).collect()
    }
}

// Tests.
