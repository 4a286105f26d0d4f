//! Library root for `postmaster-bot`.
//!
//! Postmaster is a Telegram bot that helps users post about their day:
//! - Users send short notes ("events") throughout the day
//! - Each note is stored against the user
//! - `/generate` sends the day's notes to an LLM, which writes
//!   LinkedIn, Instagram, and Twitter post drafts
//!
//! The bot integrates with Telegram for chat, SurrealDB for storage,
//! and OpenAI for drafts. Each service sits behind a trait so that
//! implementations can be swapped, and mocked in tests.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the postmaster runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with database, LLM, and chat clients
/// - Starts the update loop until Ctrl-C
pub async fn start(config: Config) -> Void {
    info!("Starting postmaster-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
