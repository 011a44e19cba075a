//! The app mention workflow: strip the mention, route, reply in thread.

use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        error::{RelayError, RelayResult, UpstreamKind},
        prompts::{APOLOGY_REPLY, TRUNCATION_NOTICE},
        types::{InboundEvent, OutboundMessage},
    },
    interaction::intent::{self, Intent},
    service::{chat::ChatClient, llm::LlmClient, weather::WeatherClient},
};

/// What became of a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionOutcome {
    /// Nothing left after removing the mention.
    EmptyText,
    /// The event carried no channel to answer in.
    NoChannel,
    /// A reply (or the apology) was posted.
    Replied,
    /// Posting failed; already logged.
    PostFailed,
}

/// Answer one app mention.
///
/// Failures while producing the reply become the fixed apology in the same
/// thread. A failed post is logged and dropped.
#[instrument(skip_all, fields(channel = event.channel.as_deref().unwrap_or_default(), ts = event.ts.as_deref().unwrap_or_default()))]
pub async fn handle_app_mention(event: &InboundEvent, llm: &LlmClient, weather: &WeatherClient, chat: &ChatClient) -> MentionOutcome {
    let text = strip_mention(event.text.as_deref().unwrap_or_default());

    if text.is_empty() {
        info!("Mention carried no text; not replying.");
        return MentionOutcome::EmptyText;
    }

    let Some(channel) = event.channel.clone() else {
        warn!("Mention carried no channel; not replying.");
        return MentionOutcome::NoChannel;
    };

    let reply = match generate_reply(text, llm, weather).await {
        Ok(reply) => reply,
        Err(err) => {
            log_reply_failure(&err);
            APOLOGY_REPLY.to_string()
        }
    };

    let message = OutboundMessage {
        channel,
        text: reply,
        thread_ts: event.ts.clone(),
    };

    match chat.send_message(&message).await {
        Ok(()) => MentionOutcome::Replied,
        Err(err) => {
            error!("Reply was not delivered: {}", err);
            MentionOutcome::PostFailed
        }
    }
}

fn log_reply_failure(err: &RelayError) {
    match err.upstream_kind() {
        Some(UpstreamKind::Status) => error!("Upstream rejected the request: {}", err),
        Some(UpstreamKind::Malformed) => error!("Upstream answered with an unexpected body: {}", err),
        Some(UpstreamKind::Transport) => error!("Upstream was unreachable: {}", err),
        None => error!("Error while generating reply: {}", err),
    }
}

/// Route the text to the matching upstream and produce the reply body.
async fn generate_reply(text: &str, llm: &LlmClient, weather: &WeatherClient) -> RelayResult<String> {
    match intent::classify(text) {
        Intent::Weather => {
            info!("Routing to weather.");
            Ok(weather.current_report().await)
        }
        Intent::Completion => {
            info!("Routing to completion.");

            let completion = llm.complete(text).await?;

            if completion.is_truncated() {
                warn!("Completion hit the token limit.");
                Ok(format!("{}{}", completion.text, TRUNCATION_NOTICE))
            } else {
                Ok(completion.text)
            }
        }
    }
}

/// Remove the first `<@...>` mention token and the whitespace after it, then trim.
pub fn strip_mention(text: &str) -> &str {
    let Some(start) = text.find("<@") else {
        return text.trim();
    };

    let Some(len) = text[start..].find('>') else {
        return text.trim();
    };

    let before = &text[..start];
    let after = text[start + len + 1..].trim_start();

    // The mention normally leads the message; keep the rest intact otherwise.
    if before.trim().is_empty() { after.trim() } else { text.trim() }
}

// Tests.
