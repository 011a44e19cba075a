use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Inbound.

/// The Slack Events API envelope, reduced to the fields the relay reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub event: Option<InboundEvent>,
}

impl InboundEnvelope {
    /// Whether this is the one-time endpoint handshake.
    pub fn is_url_verification(&self) -> bool {
        self.kind == "url_verification"
    }
}

/// The inner `event` object of an event callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

impl InboundEvent {
    pub fn is_app_mention(&self) -> bool {
        self.kind == "app_mention"
    }
}

// Completions.

/// Why the upstream model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    #[default]
    #[serde(other)]
    Other,
}

/// Text produced by the completion client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub text: String,
    pub finish_reason: FinishReason,
}

impl CompletionResult {
    /// True when the model hit the output token limit.
    pub fn is_truncated(&self) -> bool {
        self.finish_reason == FinishReason::Length
    }
}

// Outbound.

/// A message to post back to the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel: String,
    pub text: String,
    pub thread_ts: Option<String>,
}

/// Status reported back to the platform in the webhook response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Success,
    SkippedDuplicateEvent,
    #[serde(rename = "unhandled_error_in_gas")]
    UnhandledError,
}
