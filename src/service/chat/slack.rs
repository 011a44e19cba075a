//! Slack responder.
//!
//! Posts replies through `chat.postMessage` with the bot token, threading them
//! under the mention when a timestamp is supplied.

use crate::base::{
    config::Config,
    error::{RelayError, RelayResult},
    types::{OutboundMessage, Res},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{error, info, instrument};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub fn slack(config: &Config) -> Res<Self> {
        let client = SlackChatClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// Slack client implementation.
#[derive(Clone)]
pub struct SlackChatClient {
    bot_token: SlackApiToken,
    client: Arc<FullClient>,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        Ok(Self { bot_token, client })
    }
}

/// Build the `chat.postMessage` request for a reply.
fn build_post_request(message: &OutboundMessage) -> SlackApiChatPostMessageRequest {
    let content = SlackMessageContent::new().with_text(message.text.clone());
    let request = SlackApiChatPostMessageRequest::new(SlackChannelId(message.channel.clone()), content);

    match &message.thread_ts {
        Some(thread_ts) => request.with_thread_ts(SlackTs(thread_ts.clone())),
        None => request,
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    #[instrument(name = "SlackChatClient::send_message", skip(self, message), fields(channel = %message.channel))]
    async fn send_message(&self, message: &OutboundMessage) -> RelayResult<()> {
        let request = build_post_request(message);
        let session = self.client.open_session(&self.bot_token);

        match session.chat_post_message(&request).await {
            Ok(_) => {
                info!("Posted reply to Slack.");
                Ok(())
            }
            Err(err) => {
                error!("Failed to post reply to Slack: {}", err);
                Err(RelayError::Post(err.to_string()))
            }
        }
    }
}

// Tests.
