//! Handles `/start`: registers the user on first contact.

use tracing::{error, instrument};

use crate::{
    base::{
        prompts,
        types::{ChatUser, Void},
    },
    service::{chat::ChatClient, db::DbClient},
};

use super::InteractionError;

/// Registers the user (if absent) and replies with a welcome.
///
/// Store failures are logged and answered with a generic failure reply.
#[instrument(skip(user, db, chat), fields(user_id = user.id))]
pub async fn handle_start(chat_id: i64, user: &ChatUser, db: &DbClient, chat: &ChatClient) -> Void {
    let reply = match handle_start_internal(user, db).await {
        Ok(()) => prompts::welcome_reply(&user.first_name),
        Err(err) => {
            error!("Error while registering user: {}", err);
            err.reply().to_string()
        }
    };

    chat.send_message(chat_id, &reply).await?;

    Ok(())
}

async fn handle_start_internal(user: &ChatUser, db: &DbClient) -> Result<(), InteractionError> {
    db.upsert_user_if_absent(user).await.map_err(InteractionError::Database)?;

    Ok(())
}
