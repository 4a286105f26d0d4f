//! Handles `/generate`: turns today's events into post drafts.

use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        day, prompts,
        types::{ChatUser, Event, Void},
    },
    service::{chat::ChatClient, db::DbClient, llm::LlmClient},
};

use super::InteractionError;

/// Generates drafts from the user's events of the current day.
///
/// A placeholder animation is shown while the work runs and removed before the
/// final reply, whatever the outcome. The generator is not called when there
/// are no events today. If the reply cannot be delivered, the generic failure
/// reply is sent in its place.
#[instrument(skip(user, config, db, llm, chat), fields(user_id = user.id))]
pub async fn handle_generate(chat_id: i64, user: &ChatUser, config: &Config, db: &DbClient, llm: &LlmClient, chat: &ChatClient) -> Void {
    let placeholder_id = chat
        .send_animation(chat_id, &config.placeholder_animation_url, &prompts::placeholder_caption(&user.first_name))
        .await?;

    let result = handle_generate_internal(user, config, db, llm).await;

    if let Err(err) = chat.delete_message(chat_id, placeholder_id).await {
        warn!("Failed to delete placeholder message: {}", err);
    }

    let reply = match result {
        Ok(Some(draft)) => draft,
        Ok(None) => prompts::NO_EVENTS_REPLY.to_string(),
        Err(err) => {
            error!("Error while generating drafts: {}", err);
            err.reply().to_string()
        }
    };

    if let Err(err) = chat.send_message(chat_id, &reply).await {
        error!("Failed to send reply: {}", err);
        chat.send_message(chat_id, prompts::GENERIC_FAILURE_REPLY).await?;
    }

    Ok(())
}

/// Returns the draft text, or `None` when the user has no events today.
async fn handle_generate_internal(user: &ChatUser, config: &Config, db: &DbClient, llm: &LlmClient) -> Result<Option<String>, InteractionError> {
    let (start, end) = day::today_range(config.utc_offset_minutes).map_err(InteractionError::Internal)?;

    let events = db.get_events_in_range(user.id, start, end).await.map_err(InteractionError::Database)?;

    if events.is_empty() {
        info!("No events between {} and {}.", start, end);
        return Ok(None);
    }

    info!("Generating drafts from {} events ...", events.len());

    let draft = llm.generate_draft(&config.draft_system_directive, &join_event_texts(&events)).await?;

    // Usage accounting never blocks the reply.
    if let Err(err) = db.increment_user_tokens(user.id, draft.prompt_tokens, draft.completion_tokens).await {
        error!("Failed to record token usage: {}", err);
    }

    Ok(Some(draft.text))
}

/// Joins event texts into the generator's input.
fn join_event_texts(events: &[Event]) -> String {
    events.iter().map(|event| event.text.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(text: &str) -> Event {
        Event {
            platform_id: 1,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_join_event_texts() {
        assert_eq!(join_event_texts(&[event("A"), event("B")]), "A, B");
        assert_eq!(join_event_texts(&[event("only")]), "only");
        assert_eq!(join_event_texts(&[]), "");
    }
}
