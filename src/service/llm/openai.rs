//! OpenAI-compatible chat completions client.
//!
//! Requests are built with the `async-openai` types and sent with `reqwest`,
//! which keeps the HTTP status and raw body available for diagnostics. The
//! default endpoint is Groq, but any `/chat/completions` compatible base works.

use std::sync::Arc;

use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::base::{
    config::Config,
    error::{RelayError, RelayResult},
    types::{CompletionResult, FinishReason, Res},
};

use super::{GenericLlmClient, LlmClient};

const SERVICE: &str = "llm";

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Wire types.

/// The subset of a chat completion response the relay reads.
#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: Option<ChatCompletionMessage>,
    #[serde(default)]
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

// Specific implementations.

/// OpenAI-compatible LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    http: reqwest::Client,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI-compatible LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.llm_api_base.trim_end_matches('/'))
    }

    /// Build the single-exchange request: system directive, then the user turn.
    #[allow(deprecated)]
    fn build_request(&self, user_text: &str) -> Res<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default().content(self.config.llm_system_directive.as_str()).build()?.into(),
            ChatCompletionRequestUserMessageArgs::default().content(user_text).build()?.into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.llm_model)
            .messages(messages)
            .temperature(self.config.llm_temperature)
            .top_p(self.config.llm_top_p)
            .max_tokens(self.config.llm_max_tokens)
            .stream(false)
            .build()?;

        Ok(request)
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::complete", skip_all)]
    async fn complete(&self, user_text: &str) -> RelayResult<CompletionResult> {
        let request = self.build_request(user_text).map_err(|err| RelayError::upstream_transport(SERVICE, err))?;

        info!("LLM request: model={}, user_input_length={}", self.config.llm_model, user_text.chars().count());

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.llm_api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| RelayError::upstream_transport(SERVICE, err))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| RelayError::upstream_transport(SERVICE, err))?;

        info!("LLM response status: {}", status.as_u16());

        if !status.is_success() {
            let err = RelayError::upstream_status(SERVICE, status.as_u16(), &body);
            error!("LLM request failed: {}", err);
            return Err(err);
        }

        parse_completion(&body).inspect_err(|err| error!("Unexpected LLM response shape: {}", err))
    }
}

/// Extract the first choice's text and finish reason from a success body.
pub fn parse_completion(body: &str) -> RelayResult<CompletionResult> {
    let parsed: ChatCompletionBody = serde_json::from_str(body).map_err(|_| RelayError::upstream_malformed(SERVICE, body))?;

    let choice = parsed.choices.into_iter().next().ok_or_else(|| RelayError::upstream_malformed(SERVICE, body))?;
    let text = choice.message.and_then(|message| message.content).ok_or_else(|| RelayError::upstream_malformed(SERVICE, body))?;

    Ok(CompletionResult {
        text,
        finish_reason: choice.finish_reason.unwrap_or_default(),
    })
}

// Tests.
