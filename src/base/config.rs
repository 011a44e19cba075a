//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::{
    error::{RelayError, RelayResult},
    prompts,
};

use super::types::Res;

/// Default OpenAI-compatible API base (Groq).
fn default_llm_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

/// Default completion model to use.
fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

/// Default sampling temperature for the completion model.
fn default_llm_temperature() -> f32 {
    0.5
}

/// Default nucleus sampling mass.
fn default_llm_top_p() -> f32 {
    1.0
}

/// Default max output tokens.
fn default_llm_max_tokens() -> u32 {
    1024
}

/// Default system directive for the completion model.
fn default_llm_system_directive() -> String {
    prompts::COMPLETION_SYSTEM_DIRECTIVE.to_string()
}

/// Default YOLP weather endpoint.
fn default_weather_api_url() -> String {
    "https://map.yahooapis.jp/weather/V1/place".to_string()
}

/// Default forecast coordinates as `longitude,latitude` (Tokyo Station).
fn default_weather_coordinates() -> String {
    "139.7671,35.6812".to_string()
}

/// Default listen address.
fn default_server_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Default path for Slack event deliveries.
fn default_server_events_path() -> String {
    "/slack/events".to_string()
}

/// Default dedup backend.
fn default_dedup_endpoint() -> String {
    "memory".to_string()
}

/// Default dedup window in seconds.
fn default_dedup_ttl_secs() -> u64 {
    600
}

/// Configuration for the relay-bot application.
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

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// LLM provider API key (`LLM_API_KEY`).
    #[serde(default)]
    pub llm_api_key: String,
    /// Base URL of the OpenAI-compatible API (`LLM_API_BASE`).
    #[serde(default = "default_llm_api_base")]
    pub llm_api_base: String,
    /// Completion model to use (`LLM_MODEL`).
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Sampling temperature (`LLM_TEMPERATURE`).
    /// Value between 0 and 2. Higher values like 0.8 make output more random,
    /// while lower values like 0.2 make it more focused and deterministic.
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,
    /// Nucleus sampling mass (`LLM_TOP_P`), between 0 and 1.
    #[serde(default = "default_llm_top_p")]
    pub llm_top_p: f32,
    /// Max output tokens (`LLM_MAX_TOKENS`).
    #[serde(default = "default_llm_max_tokens")]
    pub llm_max_tokens: u32,
    /// Optional custom system directive to override the default (`LLM_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_llm_system_directive")]
    pub llm_system_directive: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    #[serde(default)]
    pub slack_bot_token: String,
    /// YOLP application ID (`WEATHER_APP_ID`).
    #[serde(default)]
    pub weather_app_id: String,
    /// YOLP weather endpoint (`WEATHER_API_URL`).
    #[serde(default = "default_weather_api_url")]
    pub weather_api_url: String,
    /// Fixed `longitude,latitude` pair to forecast for (`WEATHER_COORDINATES`).
    #[serde(default = "default_weather_coordinates")]
    pub weather_coordinates: String,
    /// Socket address to listen on (`SERVER_ADDRESS`).
    #[serde(default = "default_server_address")]
    pub server_address: String,
    /// Path that receives Slack event deliveries (`SERVER_EVENTS_PATH`).
    #[serde(default = "default_server_events_path")]
    pub server_events_path: String,
    /// Dedup backend (`DEDUP_ENDPOINT`): `memory`, or a SurrealDB endpoint such as `mem://` or `ws://host:8000`.
    #[serde(default = "default_dedup_endpoint")]
    pub dedup_endpoint: String,
    /// SurrealDB username for remote dedup endpoints (`DEDUP_USERNAME`).
    #[serde(default)]
    pub dedup_username: Option<String>,
    /// SurrealDB password for remote dedup endpoints (`DEDUP_PASSWORD`).
    #[serde(default)]
    pub dedup_password: Option<String>,
    /// How long a handled event suppresses redeliveries (`DEDUP_TTL_SECS`).
    #[serde(default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base: default_llm_api_base(),
            llm_model: default_llm_model(),
            llm_temperature: default_llm_temperature(),
            llm_top_p: default_llm_top_p(),
            llm_max_tokens: default_llm_max_tokens(),
            llm_system_directive: default_llm_system_directive(),
            slack_bot_token: String::new(),
            weather_app_id: String::new(),
            weather_api_url: default_weather_api_url(),
            weather_coordinates: default_weather_coordinates(),
            server_address: default_server_address(),
            server_events_path: default_server_events_path(),
            dedup_endpoint: default_dedup_endpoint(),
            dedup_username: None,
            dedup_password: None,
            dedup_ttl_secs: default_dedup_ttl_secs(),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("RELAY_BOT"));

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

    /// Range checks on the tunables.
    pub fn validate(&self) -> Res<()> {
        if self.llm_temperature < 0.0 || self.llm_temperature > 2.0 {
            return Err(anyhow::anyhow!("LLM temperature must be between 0 and 2."));
        }

        if self.llm_top_p < 0.0 || self.llm_top_p > 1.0 {
            return Err(anyhow::anyhow!("LLM top_p must be between 0 and 1."));
        }

        if self.llm_max_tokens < 1 || self.llm_max_tokens > 32768 {
            return Err(anyhow::anyhow!("LLM max tokens must be between 1 and 32768."));
        }

        if self.dedup_ttl_secs == 0 {
            return Err(anyhow::anyhow!("Dedup TTL must be at least one second."));
        }

        if !self.server_events_path.starts_with('/') {
            return Err(anyhow::anyhow!("Server events path must start with `/`."));
        }

        Ok(())
    }

    /// Names of the required secrets that are absent or blank.
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        [
            ("llm_api_key", &self.llm_api_key),
            ("slack_bot_token", &self.slack_bot_token),
            ("weather_app_id", &self.weather_app_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Fails with [`RelayError::Config`] unless every required secret is set.
    pub fn require_secrets(&self) -> RelayResult<()> {
        let missing = self.missing_secrets();

        if missing.is_empty() { Ok(()) } else { Err(RelayError::Config { missing }) }
    }
}
