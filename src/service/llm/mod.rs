pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{error::RelayResult, types::CompletionResult};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the core functionality for interacting with large language models.
/// Implementing this trait allows different LLM providers to be used with the relay-bot.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Answer one user message in a single exchange.
    ///
    /// No history is carried between calls. Fails with
    /// [`RelayError::Upstream`](crate::base::error::RelayError::Upstream) when
    /// the provider rejects the request or returns an unexpected body.
    async fn complete(&self, user_text: &str) -> RelayResult<CompletionResult>;
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
