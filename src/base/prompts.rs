//! Directives for the draft generator and the bot's canned replies.

/// System directive for the draft generator.
pub const DRAFT_SYSTEM_DIRECTIVE: &str = "Act as a senior copywriter, you write highly engaging posts for LinkedIn, Instagram, and Twitter using provided thoughts/events throughout the day.";

/// User directive for the draft generator; the day's events are appended after it.
pub const DRAFT_USER_DIRECTIVE: &str = "Write like a human, for humans. Craft three engaging social media posts tailored for LinkedIn, Instagram, and Twitter audience. Use the provided events without mentioning specific times. Focus on engaging the respective platform's audience, encouraging interaction, and driving interest in the events";

/// Animation shown while drafts are being generated.
pub const PLACEHOLDER_ANIMATION_URL: &str = "https://media.giphy.com/media/v1.Y2lkPTc5MGI3NjExcWNqa2hjZzZtenhlbG13cGYzemQ2YnR6dmI4MWh1NzlmcTZ6dGYxYSZlcD12MV9naWZzX3NlYXJjaCZjdD1n/13GIgrGdslD9oQ/giphy.gif";

/// Default support handle advertised by `/help`.
pub const SUPPORT_CONTACT: &str = "@postmasterhelp";

// Replies.

pub const GENERIC_FAILURE_REPLY: &str = "Facing difficulties! Please try again later.";
pub const QUOTA_EXCEEDED_REPLY: &str = "Reached API quota. Please try again later.";
pub const TEXT_FAILURE_REPLY: &str = "Failed to process your message.";
pub const NO_EVENTS_REPLY: &str = "No events for the day.";
pub const EVENT_NOTED_REPLY: &str = "Noted! 📝 Feel free to share your thoughts with me. When you're ready to generate a post, simply enter: /generate 🚀";

/// Welcome reply for `/start`.
pub fn welcome_reply(first_name: &str) -> String {
    format!(
        "Hey {first_name}, welcome aboard! 🌟 I'm here to craft highly engaging social media posts for you. Just keep me updated with your day's events. 📅 Let's make waves on social media together! 🌊"
    )
}

/// Caption of the placeholder animation.
pub fn placeholder_caption(first_name: &str) -> String {
    format!("Hey! {first_name}, kindly wait a moment. I am curating posts for you.")
}

/// Reply for `/help`.
pub fn help_reply(support_contact: &str) -> String {
    format!("For support contact {support_contact}")
}

/// Full user message sent to the model.
pub fn draft_user_message(user_directive: &str, events_text: &str) -> String {
    format!("{user_directive}: {events_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_reply_addresses_user() {
        assert!(welcome_reply("Ada").starts_with("Hey Ada, welcome aboard!"));
    }

    #[test]
    fn test_draft_user_message_appends_events() {
        let message = draft_user_message(DRAFT_USER_DIRECTIVE, "went running, shipped a release");

        assert!(message.starts_with("Write like a human, for humans."));
        assert!(message.ends_with("driving interest in the events: went running, shipped a release"));
    }

    #[test]
    fn test_help_reply() {
        assert_eq!(help_reply(SUPPORT_CONTACT), "For support contact @postmasterhelp");
    }
}
