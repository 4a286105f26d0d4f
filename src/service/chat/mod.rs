pub mod telegram;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Telegram. Implementing this trait allows different chat services to be used
/// with the bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Start the chat client listener.
    ///
    /// This sets up update listeners for the chat platform and processes
    /// incoming messages until shutdown.
    async fn start(&self) -> Void;

    /// Send a text message to a chat, returning the new message's id.
    async fn send_message(&self, chat_id: i64, text: &str) -> Res<i32>;

    /// Send an animation with a caption to a chat, returning the new message's id.
    ///
    /// Used for the placeholder shown while drafts are generated.
    async fn send_animation(&self, chat_id: i64, animation_url: &str, caption: &str) -> Res<i32>;

    /// Delete a previously sent message.
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
