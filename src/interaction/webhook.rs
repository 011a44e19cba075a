//! HTTP boundary for Slack event deliveries.
//!
//! Every delivery is answered with HTTP 200; the outcome is reported in the
//! body.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        error::RelayError,
        prompts::LIVENESS_MESSAGE,
        types::{InboundEnvelope, Res, WebhookStatus},
    },
    interaction::app_mention,
    runtime::Runtime,
    service::dedup::dedup_key,
};

/// Body of a webhook response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookReply {
    /// Handshake: the challenge token echoed verbatim.
    Challenge(String),
    /// `{"status": ...}`.
    Status(WebhookStatus),
    /// `{"error": "Configuration error"}`.
    ConfigError,
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        match self {
            WebhookReply::Challenge(challenge) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], challenge).into_response(),
            WebhookReply::Status(status) => (StatusCode::OK, Json(json!({ "status": status }))).into_response(),
            WebhookReply::ConfigError => (StatusCode::OK, Json(json!({ "error": "Configuration error" }))).into_response(),
        }
    }
}

/// Build the router: liveness on `/`, deliveries on the configured events path.
pub fn router(runtime: Runtime) -> Router {
    let events_path = runtime.config.server_events_path.clone();

    Router::new().route("/", get(handle_liveness)).route(&events_path, post(handle_events)).with_state(runtime)
}

async fn handle_liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn handle_events(State(runtime): State<Runtime>, body: Bytes) -> WebhookReply {
    handle_delivery(&runtime, &body).await
}

/// Process one delivery body and decide the reply.
///
/// Never fails: anything that escapes the workflow becomes
/// [`WebhookStatus::UnhandledError`].
#[instrument(skip_all)]
pub async fn handle_delivery(runtime: &Runtime, body: &[u8]) -> WebhookReply {
    if let Err(err) = runtime.config.require_secrets() {
        error!("{}", err);
        return WebhookReply::ConfigError;
    }

    match handle_delivery_internal(runtime, body).await {
        Ok(reply) => reply,
        Err(err) => {
            error!("Unhandled error while processing delivery: {:#}", err);
            WebhookReply::Status(WebhookStatus::UnhandledError)
        }
    }
}

async fn handle_delivery_internal(runtime: &Runtime, body: &[u8]) -> Res<WebhookReply> {
    let envelope: InboundEnvelope = serde_json::from_slice(body).map_err(RelayError::Parse)?;

    info!("Received delivery of type `{}`.", envelope.kind);

    // Handshake.

    if envelope.is_url_verification() {
        info!("Responding to URL verification challenge.");
        return Ok(WebhookReply::Challenge(envelope.challenge.unwrap_or_default()));
    }

    let Some(event) = envelope.event else {
        return Ok(WebhookReply::Status(WebhookStatus::Success));
    };

    // Dedup: record before any downstream call.

    if let Some(ts) = event.ts.as_deref() {
        let key = dedup_key(event.channel.as_deref().unwrap_or_default(), ts);

        if runtime.dedup.exists(&key).await? {
            warn!("Skipping duplicate delivery `{}`.", key);
            return Ok(WebhookReply::Status(WebhookStatus::SkippedDuplicateEvent));
        }

        runtime.dedup.put(&key, runtime.dedup_ttl()).await?;
    }

    // Only app mentions do work.

    if event.is_app_mention() {
        let outcome = app_mention::handle_app_mention(&event, &runtime.llm, &runtime.weather, &runtime.chat).await;
        info!("Mention handled: {:?}.", outcome);
    } else {
        info!("Ignoring event of type `{}`.", event.kind);
    }

    Ok(WebhookReply::Status(WebhookStatus::Success))
}
