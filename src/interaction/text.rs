//! Handles plain text: each message is stored as one event.

use tracing::{error, instrument};

use crate::{
    base::{
        prompts,
        types::{ChatUser, Void},
    },
    service::{chat::ChatClient, db::DbClient},
};

use super::InteractionError;

/// Stores the text as an event and acknowledges it.
#[instrument(skip(user, text, db, chat), fields(user_id = user.id))]
pub async fn handle_text(chat_id: i64, user: &ChatUser, text: &str, db: &DbClient, chat: &ChatClient) -> Void {
    let reply = match handle_text_internal(user, text, db).await {
        Ok(()) => prompts::EVENT_NOTED_REPLY,
        Err(err) => {
            error!("Error while storing event: {}", err);
            prompts::TEXT_FAILURE_REPLY
        }
    };

    chat.send_message(chat_id, reply).await?;

    Ok(())
}

async fn handle_text_internal(user: &ChatUser, text: &str, db: &DbClient) -> Result<(), InteractionError> {
    // Users who never sent `/start` still get a record before their first event.
    db.upsert_user_if_absent(user).await.map_err(InteractionError::Database)?;

    db.create_event(user.id, text).await.map_err(InteractionError::Database)?;

    Ok(())
}
