//! Library root for `relay-bot`.
//!
//! Relay-bot answers Slack app mentions over the Events API webhook:
//! - Weather questions get the current rainfall and a short-range forecast
//!   from Yahoo! JAPAN's YOLP weather API for a fixed location
//! - Everything else is answered by an OpenAI-compatible chat completion model
//! - Replies are posted in the thread of the mention
//!
//! Redelivered events are suppressed with a short-lived dedup cache. Each
//! external service sits behind a trait so that implementations can be swapped
//! or faked in tests.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the relay-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with dedup cache, LLM, weather, and chat clients
/// - Serves the webhook until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting relay-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().map_err(|_| anyhow::anyhow!("Failed to install the rustls crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
