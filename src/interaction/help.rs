use tracing::instrument;

use crate::{
    base::{config::Config, prompts, types::Void},
    service::chat::ChatClient,
};

/// Replies with the support contact.
#[instrument(skip(config, chat))]
pub async fn handle_help(chat_id: i64, config: &Config, chat: &ChatClient) -> Void {
    chat.send_message(chat_id, &prompts::help_reply(&config.support_contact)).await?;

    Ok(())
}
