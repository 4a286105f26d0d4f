pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::base::types::Draft;

// Errors.

/// Failure modes of a draft generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider refused the call for quota or rate-limit reasons.
    #[error("LLM quota exceeded")]
    QuotaExceeded,
    /// Any other failure.
    #[error("LLM call failed: {0}")]
    Other(#[from] anyhow::Error),
}

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the single call the bot makes to a language model.
/// Implementing this trait allows different LLM providers to be used with the bot.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Generate the day's post drafts.
    ///
    /// `system_directive` instructs the model; `events_text` holds the user's events,
    /// already joined. Exactly one remote call is made: there is no retry.
    async fn generate_draft(&self, system_directive: &str, events_text: &str) -> Result<Draft, GenerationError>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}
