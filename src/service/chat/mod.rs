pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{error::RelayResult, types::OutboundMessage};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the outbound half of a chat platform: posting replies.
/// Implementing this trait allows different chat services to be used with the
/// relay-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Post a message, threaded under `thread_ts` when one is given.
    ///
    /// Success and failure are both logged by the implementation; failures are
    /// returned as [`RelayError::Post`](crate::base::error::RelayError::Post)
    /// and never retried.
    async fn send_message(&self, message: &OutboundMessage) -> RelayResult<()>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
