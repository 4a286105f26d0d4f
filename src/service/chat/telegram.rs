//! Chat service integration for the postmaster bot.
//!
//! This module provides the Telegram implementation of `GenericChatClient`:
//! - Receiving commands and text messages via long polling
//! - Sending text replies and placeholder animations
//! - Deleting placeholder replies

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::{
    dispatching::{HandlerExt, UpdateFilterExt},
    prelude::*,
    types::{InputFile, MessageId},
    utils::command::BotCommands,
};
use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{ChatUser, Res, Void},
    },
    interaction,
    service::{db::DbClient, llm::LlmClient},
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the telegram implementation.

impl ChatClient {
    /// Creates a new Telegram chat client.
    pub fn telegram(config: &Config, db: DbClient, llm: LlmClient) -> Self {
        let client = TelegramChatClient::new(config, db, llm);
        Self { inner: Arc::new(client) }
    }
}

impl From<TelegramChatClient> for ChatClient {
    fn from(client: TelegramChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Commands.

/// Bot commands that can be invoked with `/`.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot.")]
    Start,
    #[command(description = "Get support.")]
    Help,
    #[command(description = "Generate post drafts from today's events.")]
    Generate,
}

// Structs.

/// User state shared with the dispatcher endpoints.
struct TelegramUserState {
    config: Config,
    db: DbClient,
    llm: LlmClient,
    chat: ChatClient,
}

/// Telegram client implementation.
#[derive(Clone)]
pub struct TelegramChatClient {
    bot: Bot,
    config: Config,
    db: DbClient,
    llm: LlmClient,
}

impl TelegramChatClient {
    /// Create a new Telegram chat client.
    #[instrument(name = "TelegramChatClient::new", skip_all)]
    pub fn new(config: &Config, db: DbClient, llm: LlmClient) -> Self {
        Self {
            bot: Bot::new(config.telegram_bot_token.clone()),
            config: config.clone(),
            db,
            llm,
        }
    }
}

#[async_trait]
impl GenericChatClient for TelegramChatClient {
    async fn start(&self) -> Void {
        // Advertise the command menu; the bot works without it.

        if let Err(err) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {}", err);
        }

        let state = Arc::new(TelegramUserState {
            config: self.config.clone(),
            db: self.db.clone(),
            llm: self.llm.clone(),
            chat: ChatClient::from(self.clone()),
        });

        // Known commands first; everything else that carries text is an event.

        let handler = Update::filter_message()
            .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
            .branch(dptree::endpoint(handle_text));

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![state])
            .default_handler(|upd| async move {
                warn!("Unhandled update: {:?}", upd.id);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Bot stopped.");

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, chat_id: i64, text: &str) -> Res<i32> {
        let mut last_id = 0;

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let message = self.bot.send_message(ChatId(chat_id), chunk).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;
            last_id = message.id.0;
        }

        Ok(last_id)
    }

    #[instrument(skip(self, caption))]
    async fn send_animation(&self, chat_id: i64, animation_url: &str, caption: &str) -> Res<i32> {
        let animation = InputFile::url(animation_url.parse()?);

        let message = self
            .bot
            .send_animation(ChatId(chat_id), animation)
            .caption(caption)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send animation: {}", e))?;

        Ok(message.id.0)
    }

    #[instrument(skip(self))]
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Void {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete message: {}", e))?;

        Ok(())
    }
}

// Helpers.

/// Telegram's limit on a text message, in UTF-16 code units.
const MAX_MESSAGE_LEN: usize = 4096;

/// Splits text into pieces Telegram accepts, breaking after the last newline that fits.
fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    loop {
        let mut units = 0;
        let window_end = rest
            .char_indices()
            .find(|(_, c)| {
                units += c.len_utf16();
                units > limit
            })
            .map_or(rest.len(), |(i, _)| i);

        if window_end == rest.len() {
            chunks.push(rest);
            return chunks;
        }

        let split_at = rest[..window_end].rfind('\n').filter(|&i| i > 0).map_or(window_end, |i| i + 1);
        let (chunk, tail) = rest.split_at(split_at);

        chunks.push(chunk);
        rest = tail;
    }
}

/// Converts the Telegram sender into the bot's identity type.
fn chat_user(user: &teloxide::types::User) -> Res<ChatUser> {
    Ok(ChatUser {
        id: i64::try_from(user.id.0)?,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_bot: user.is_bot,
        username: user.username.clone(),
    })
}

// Dispatcher endpoints.

/// Handles `/start`, `/help` and `/generate`.
#[instrument(skip_all, fields(chat_id = %msg.chat.id))]
async fn handle_command(msg: Message, cmd: Command, state: Arc<TelegramUserState>) -> Void {
    info!("Received command {:?} ...", cmd);

    let chat_id = msg.chat.id.0;

    let result = match cmd {
        Command::Help => interaction::help::handle_help(chat_id, &state.config, &state.chat).await,
        Command::Start | Command::Generate => {
            let Some(from) = msg.from.as_ref() else {
                warn!("Skipping command without a sender.");
                return Ok(());
            };
            let user = chat_user(from)?;

            if cmd == Command::Start {
                interaction::start::handle_start(chat_id, &user, &state.db, &state.chat).await
            } else {
                interaction::generate::handle_generate(chat_id, &user, &state.config, &state.db, &state.llm, &state.chat).await
            }
        }
    };

    // Log any errors.
    if let Err(err) = &result {
        error!("Error while handling: {}", err);
    }

    Ok(())
}

/// Handles every other message: text becomes an event.
#[instrument(skip_all, fields(chat_id = %msg.chat.id))]
async fn handle_text(msg: Message, state: Arc<TelegramUserState>) -> Void {
    let Some(text) = msg.text() else {
        warn!("Skipping message without text.");
        return Ok(());
    };

    let Some(from) = msg.from.as_ref() else {
        warn!("Skipping message without a sender.");
        return Ok(());
    };

    info!("Received text message ...");

    let user = chat_user(from)?;
    let result = interaction::text::handle_text(msg.chat.id.0, &user, text, &state.db, &state.chat).await;

    // Log any errors.
    if let Err(err) = &result {
        error!("Error while handling: {}", err);
    }

    Ok(())
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "postmaster_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "postmaster_bot").unwrap(), Command::Help);
        assert_eq!(Command::parse("/generate@postmaster_bot", "postmaster_bot").unwrap(), Command::Generate);
        assert!(Command::parse("/unknown", "postmaster_bot").is_err());
    }

    #[test]
    fn test_split_message_short_text_is_one_chunk() {
        assert_eq!(split_message("hello", MAX_MESSAGE_LEN), vec!["hello"]);
        assert_eq!(split_message("", MAX_MESSAGE_LEN), vec![""]);
    }

    #[test]
    fn test_split_message_breaks_after_newline() {
        assert_eq!(split_message("LinkedIn: a\nTwitter: b", 16), vec!["LinkedIn: a\n", "Twitter: b"]);
    }

    #[test]
    fn test_split_message_long_draft() {
        let draft = format!("{}\n{}\n{}", "a".repeat(3000), "b".repeat(3000), "c".repeat(5000));

        let chunks = split_message(&draft, MAX_MESSAGE_LEN);

        assert_eq!(chunks.concat(), draft);
        assert!(chunks.iter().all(|chunk| chunk.encode_utf16().count() <= MAX_MESSAGE_LEN));
        assert_eq!(chunks[0], format!("{}\n", "a".repeat(3000)));
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_split_message_counts_utf16_units() {
        // Each emoji is two UTF-16 code units.
        let text = "\u{1F600}".repeat(3);

        assert_eq!(split_message(&text, 4), vec!["\u{1F600}\u{1F600}", "\u{1F600}"]);
    }
}
