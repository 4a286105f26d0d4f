//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::Res;

/// Default sampling temperature for the draft model.
fn default_openai_temperature() -> f32 {
    0.7
}

/// Default max output tokens for the draft model.
fn default_openai_max_tokens() -> u32 {
    4096
}

fn default_db_namespace() -> String {
    "postmaster".to_string()
}

fn default_db_database() -> String {
    "bot".to_string()
}

/// Default system directive for the draft generator.
fn default_draft_system_directive() -> String {
    prompts::DRAFT_SYSTEM_DIRECTIVE.to_string()
}

/// Default user directive for the draft generator.
fn default_draft_user_directive() -> String {
    prompts::DRAFT_USER_DIRECTIVE.to_string()
}

fn default_placeholder_animation_url() -> String {
    prompts::PLACEHOLDER_ANIMATION_URL.to_string()
}

fn default_support_contact() -> String {
    prompts::SUPPORT_CONTACT.to_string()
}

/// Configuration for the postmaster bot.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Telegram bot token (`POSTMASTER_TELEGRAM_BOT_TOKEN`).
    pub telegram_bot_token: String,
    /// OpenAI API key (`POSTMASTER_OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// OpenAI model used to write drafts (`POSTMASTER_OPENAI_MODEL`).
    pub openai_model: String,
    /// Sampling temperature for the draft model (`POSTMASTER_OPENAI_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Max output tokens for the draft model (`POSTMASTER_OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Database endpoint URL (`POSTMASTER_DB_ENDPOINT`), e.g. `ws://localhost:8000` or `mem://`.
    pub db_endpoint: String,
    /// Database username (`POSTMASTER_DB_USERNAME`); sign-in is skipped when absent.
    #[serde(default)]
    pub db_username: Option<String>,
    /// Database password (`POSTMASTER_DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,
    /// Database namespace (`POSTMASTER_DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`POSTMASTER_DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Optional custom system directive for drafts (`POSTMASTER_DRAFT_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_draft_system_directive")]
    pub draft_system_directive: String,
    /// Optional custom user directive for drafts (`POSTMASTER_DRAFT_USER_DIRECTIVE`).
    #[serde(default = "default_draft_user_directive")]
    pub draft_user_directive: String,
    /// Animation shown while drafts are generated (`POSTMASTER_PLACEHOLDER_ANIMATION_URL`).
    #[serde(default = "default_placeholder_animation_url")]
    pub placeholder_animation_url: String,
    /// Handle advertised by `/help` (`POSTMASTER_SUPPORT_CONTACT`).
    #[serde(default = "default_support_contact")]
    pub support_contact: String,
    /// Fixed UTC offset, in minutes, used to decide what "today" means (`POSTMASTER_UTC_OFFSET_MINUTES`).
    /// Server local time is used when unset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("POSTMASTER"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Res<()> {
        if self.openai_temperature < 0.0 || self.openai_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 2."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if let Some(offset) = self.utc_offset_minutes
            && !(-14 * 60..=14 * 60).contains(&offset)
        {
            return Err(anyhow::anyhow!("UTC offset must be between -840 and 840 minutes."));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(inner: ConfigInner) -> Config {
        Config { inner: Arc::new(inner) }
    }

    fn valid_inner() -> ConfigInner {
        ConfigInner {
            openai_temperature: default_openai_temperature(),
            openai_max_tokens: default_openai_max_tokens(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(config_with(valid_inner()).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_temperature() {
        let config = config_with(ConfigInner {
            openai_temperature: 2.5,
            ..valid_inner()
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_max_tokens() {
        let config = config_with(ConfigInner {
            openai_max_tokens: 0,
            ..valid_inner()
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_utc_offset() {
        let config = config_with(ConfigInner {
            utc_offset_minutes: Some(15 * 60),
            ..valid_inner()
        });

        assert!(config.validate().is_err());

        let config = config_with(ConfigInner {
            utc_offset_minutes: Some(-5 * 60),
            ..valid_inner()
        });

        assert!(config.validate().is_ok());
    }
}
