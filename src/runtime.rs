//! Runtime services and shared state for the relay-bot.

use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction,
    service::{chat::ChatClient, dedup::DedupCache, llm::LlmClient, weather::WeatherClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration and one handle per service.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The dedup cache instance.
    pub dedup: DedupCache,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The weather client instance.
    pub weather: WeatherClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        let missing = config.missing_secrets();
        if !missing.is_empty() {
            error!("Missing required secrets: {}. Event deliveries will be answered with a configuration error.", missing.join(", "));
        }

        // Initialize the dedup cache.
        let dedup = DedupCache::from_config(&config).await?;

        // Initialize the upstream clients.
        let llm = LlmClient::openai(&config);
        let weather = WeatherClient::yahoo(&config);

        // Initialize the slack client.
        let chat = ChatClient::slack(&config)?;

        Ok(Self { config, dedup, llm, weather, chat })
    }

    /// How long a handled event suppresses redeliveries.
    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.config.dedup_ttl_secs)
    }

    /// Serve the webhook until Ctrl-C.
    pub async fn start(&self) -> Void {
        let listener = TcpListener::bind(&self.config.server_address).await?;

        info!("Listening for Slack events on {}{} ...", listener.local_addr()?, self.config.server_events_path);

        axum::serve(listener, interaction::webhook::router(self.clone()))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down ...");
            })
            .await?;

        Ok(())
    }
}
