//! Update handling and user interactions for the postmaster bot.
//!
//! This module holds one handler per inbound update kind:
//! - `/start` registers the user
//! - `/help` points at support
//! - `/generate` turns today's events into post drafts
//! - plain text is stored as an event
//!
//! Handlers re-read everything they need from the stores. Store and LLM failures
//! are mapped to fixed replies here; transport failures are returned to the caller.

pub mod generate;
pub mod help;
pub mod start;
pub mod text;

use thiserror::Error;

use crate::{base::prompts, service::llm::GenerationError};

/// Failures that a handler turns into a user-facing reply.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("database failure: {0}")]
    Database(anyhow::Error),
    #[error("LLM quota exceeded")]
    QuotaExceeded,
    #[error("draft generation failed: {0}")]
    Generation(anyhow::Error),
    #[error("internal failure: {0}")]
    Internal(anyhow::Error),
}

impl From<GenerationError> for InteractionError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::QuotaExceeded => InteractionError::QuotaExceeded,
            GenerationError::Other(err) => InteractionError::Generation(err),
        }
    }
}

impl InteractionError {
    /// The reply sent to the user for this failure.
    pub fn reply(&self) -> &'static str {
        match self {
            InteractionError::QuotaExceeded => prompts::QUOTA_EXCEEDED_REPLY,
            _ => prompts::GENERIC_FAILURE_REPLY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_mapping() {
        assert_eq!(InteractionError::from(GenerationError::QuotaExceeded).reply(), "Reached API quota. Please try again later.");
        assert_eq!(
            InteractionError::from(GenerationError::Other(anyhow::anyhow!("boom"))).reply(),
            "Facing difficulties! Please try again later."
        );
        assert_eq!(InteractionError::Database(anyhow::anyhow!("down")).reply(), "Facing difficulties! Please try again later.");
    }
}
