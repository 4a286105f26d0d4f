//! Integration with the OpenAI chat completion API.
//!
//! This module provides a thin wrapper around `async-openai` for generating
//! the day's post drafts, and maps provider errors into [`GenerationError`].

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, info, instrument, warn};

use crate::base::{config::Config, prompts, types::Draft};

use super::{GenerationError, GenericLlmClient, LlmClient};

/// API error codes that mean "try again later".
const QUOTA_ERROR_CODES: &[&str] = &["insufficient_quota", "rate_limit_exceeded"];

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

impl From<OpenAIError> for GenerationError {
    fn from(err: OpenAIError) -> Self {
        if let OpenAIError::ApiError(api_error) = &err
            && is_quota_error(api_error)
        {
            return GenerationError::QuotaExceeded;
        }

        GenerationError::Other(err.into())
    }
}

/// Whether the API error is a quota or rate-limit refusal.
fn is_quota_error(err: &ApiError) -> bool {
    let code = err.code.as_deref().unwrap_or_default();
    let kind = err.r#type.as_deref().unwrap_or_default();

    QUOTA_ERROR_CODES.contains(&code) || kind == "insufficient_quota"
}

/// A backoff that gives up after the first attempt.
///
/// `async-openai` retries rate-limited calls by default; rate limits must surface as quota errors instead.
fn no_retry_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new().with_max_elapsed_time(Some(Duration::ZERO)).build()
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self::with_openai_config(cfg, config)
    }

    /// Create a client against an explicit OpenAI endpoint configuration.
    pub fn with_openai_config(cfg: OpenAIConfig, config: &Config) -> Self {
        Self {
            client: Client::with_config(cfg).with_backoff(no_retry_backoff()),
            config: config.clone(),
        }
    }

    /// Build the chat completion request.
    fn build_request(&self, system_directive: &str, events_text: &str) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let user_message = prompts::draft_user_message(&self.config.draft_user_directive, events_text);

        CreateChatCompletionRequestArgs::default()
            .model(&self.config.openai_model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default().content(system_directive).build()?.into(),
                ChatCompletionRequestUserMessageArgs::default().content(user_message).build()?.into(),
            ])
            .temperature(self.config.openai_temperature)
            .max_completion_tokens(self.config.openai_max_tokens)
            .build()
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::generate_draft", skip_all)]
    async fn generate_draft(&self, system_directive: &str, events_text: &str) -> Result<Draft, GenerationError> {
        let request = self.build_request(system_directive, events_text)?;

        debug!("Requesting drafts from `{}` ...", self.config.openai_model);

        let response = self.client.chat().create(request).await.inspect_err(|err| warn!("OpenAI API call failed: {err}"))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("OpenAI response contained no draft."))?;

        let usage = response.usage.ok_or_else(|| anyhow::anyhow!("OpenAI response contained no usage."))?;

        info!(prompt_tokens = usage.prompt_tokens, completion_tokens = usage.completion_tokens, "OpenAI completion received.");

        Ok(Draft {
            text,
            prompt_tokens: usage.prompt_tokens.into(),
            completion_tokens: usage.completion_tokens.into(),
        })
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::config::ConfigInner;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    fn create_test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                openai_api_key: "test_key".to_string(),
                openai_model: "gpt-4.1-nano".to_string(),
                openai_temperature: 0.7,
                openai_max_tokens: 200u32,
                draft_user_directive: prompts::DRAFT_USER_DIRECTIVE.to_string(),
                ..Default::default()
            }),
        }
    }

    fn api_error(value: serde_json::Value) -> ApiError {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_quota_errors_map_to_quota_exceeded() {
        let err = OpenAIError::ApiError(api_error(serde_json::json!({
            "message": "You exceeded your current quota.",
            "type": "insufficient_quota",
            "param": null,
            "code": "insufficient_quota",
        })));
        assert!(matches!(GenerationError::from(err), GenerationError::QuotaExceeded));

        let err = OpenAIError::ApiError(api_error(serde_json::json!({
            "message": "Rate limit reached.",
            "type": "requests",
            "param": null,
            "code": "rate_limit_exceeded",
        })));
        assert!(matches!(GenerationError::from(err), GenerationError::QuotaExceeded));
    }

    #[test]
    fn test_other_errors_map_to_other() {
        let err = OpenAIError::ApiError(api_error(serde_json::json!({
            "message": "Incorrect API key provided.",
            "type": "invalid_request_error",
            "param": null,
            "code": "invalid_api_key",
        })));
        assert!(matches!(GenerationError::from(err), GenerationError::Other(_)));

        let err = OpenAIError::InvalidArgument("bad".to_string());
        assert!(matches!(GenerationError::from(err), GenerationError::Other(_)));
    }

    #[test]
    fn test_build_request() {
        let client = OpenAiLlmClient::new(&create_test_config());

        let request = client.build_request(prompts::DRAFT_SYSTEM_DIRECTIVE, "A, B").unwrap();

        assert_eq!(request.model, "gpt-4.1-nano");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.max_completion_tokens, Some(200));
    }

    /// Serves every request with the given status line and JSON body, counting requests.
    async fn serve_json(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    read_request(&mut socket).await;

                    let response = format!(
                        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{addr}/v1"), requests)
    }

    /// Reads the request head and its `content-length` body.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            let Some(head_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if buf.len() >= head_end + 4 + content_length {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let (api_base, requests) = serve_json(
            "429 Too Many Requests",
            r#"{"error":{"message":"Rate limit reached.","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#,
        )
        .await;

        let cfg = OpenAIConfig::new().with_api_key("test_key").with_api_base(api_base);
        let client = OpenAiLlmClient::with_openai_config(cfg, &create_test_config());

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), client.generate_draft(prompts::DRAFT_SYSTEM_DIRECTIVE, "A"))
            .await
            .expect("generation should not keep retrying");

        assert!(matches!(result, Err(GenerationError::QuotaExceeded)));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }
}
