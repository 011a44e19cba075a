use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::{Sequence, mock};
use relay_bot::{
    base::{
        clock::ManualClock,
        config::{Config, ConfigInner},
        error::{RelayError, RelayResult},
        prompts::{APOLOGY_REPLY, TRUNCATION_NOTICE},
        types::{CompletionResult, FinishReason, OutboundMessage, Res, Void, WebhookStatus},
    },
    interaction::webhook::{self, WebhookReply},
    runtime::Runtime,
    service::{
        chat::{ChatClient, GenericChatClient},
        dedup::{DedupCache, GenericDedupCache},
        llm::{GenericLlmClient, LlmClient},
        weather::{GenericWeatherClient, WeatherClient},
    },
};
use serde_json::json;

// Mocks.

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        async fn send_message(&self, message: &OutboundMessage) -> RelayResult<()>;
    }
}

mock! {
    pub Llm {}

    #[async_trait]
    impl GenericLlmClient for Llm {
        async fn complete(&self, user_text: &str) -> RelayResult<CompletionResult>;
    }
}

mock! {
    pub Weather {}

    #[async_trait]
    impl GenericWeatherClient for Weather {
        async fn current_report(&self) -> String;
    }
}

mock! {
    pub Dedup {}

    #[async_trait]
    impl GenericDedupCache for Dedup {
        async fn exists(&self, key: &str) -> Res<bool>;
        async fn put(&self, key: &str, ttl: Duration) -> Void;
    }
}

const WEATHER_REPORT: &str = "現在（1月1日 12:00）の降水強度: 0 mm/h";

/// Configuration with every secret present.
fn test_config() -> Config {
    Config::from(ConfigInner {
        llm_api_key: "gsk-test".to_string(),
        slack_bot_token: "xoxb-test".to_string(),
        weather_app_id: "dj-test".to_string(),
        ..Default::default()
    })
}

fn test_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap())
}

/// Helper function to setup the test runtime around mocked services.
fn setup_runtime(config: Config, clock: &ManualClock, llm: MockLlm, weather: MockWeather, chat: MockChat) -> Runtime {
    setup_runtime_with_dedup(config, DedupCache::memory(Arc::new(clock.clone())), llm, weather, chat)
}

fn setup_runtime_with_dedup(config: Config, dedup: DedupCache, llm: MockLlm, weather: MockWeather, chat: MockChat) -> Runtime {
    Runtime {
        config,
        dedup,
        llm: LlmClient::new(Arc::new(llm)),
        weather: WeatherClient::new(Arc::new(weather)),
        chat: ChatClient::new(Arc::new(chat)),
    }
}

fn mention_body(channel: &str, ts: &str, text: &str) -> Vec<u8> {
    json!({
        "token": "verification-token",
        "team_id": "T0001",
        "type": "event_callback",
        "event": {
            "type": "app_mention",
            "user": "U54321",
            "text": text,
            "ts": ts,
            "channel": channel,
            "event_ts": ts
        },
        "event_id": "Ev0001",
        "event_time": 1735700000
    })
    .to_string()
    .into_bytes()
}

fn completion(text: &str, finish_reason: FinishReason) -> CompletionResult {
    CompletionResult {
        text: text.to_string(),
        finish_reason,
    }
}

#[tokio::test]
async fn test_url_verification_echoes_challenge() {
    let mut llm = MockLlm::new();
    llm.expect_complete().never();
    let mut weather = MockWeather::new();
    weather.expect_current_report().never();
    let mut chat = MockChat::new();
    chat.expect_send_message().never();

    let runtime = setup_runtime(test_config(), &test_clock(), llm, weather, chat);
    let body = json!({ "token": "t", "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P", "type": "url_verification" }).to_string();

    let reply = webhook::handle_delivery(&runtime, body.as_bytes()).await;

    assert_eq!(reply, WebhookReply::Challenge("3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".to_string()));
}

#[tokio::test]
async fn test_url_verification_bypasses_dedup() {
    let runtime = setup_runtime(test_config(), &test_clock(), MockLlm::new(), MockWeather::new(), MockChat::new());
    let body = json!({ "challenge": "abc", "type": "url_verification" }).to_string();

    // Repeated handshakes are never treated as duplicates.
    assert_eq!(webhook::handle_delivery(&runtime, body.as_bytes()).await, WebhookReply::Challenge("abc".to_string()));
    assert_eq!(webhook::handle_delivery(&runtime, body.as_bytes()).await, WebhookReply::Challenge("abc".to_string()));
}

#[tokio::test]
async fn test_weather_question_routes_to_weather() {
    let mut llm = MockLlm::new();
    llm.expect_complete().never();
    let mut weather = MockWeather::new();
    weather.expect_current_report().times(1).returning(|| WEATHER_REPORT.to_string());
    let mut chat = MockChat::new();
    chat.expect_send_message()
        .withf(|message| message.channel == "C01TEST" && message.text == WEATHER_REPORT && message.thread_ts.as_deref() == Some("1735700000.000100"))
        .times(1)
        .returning(|_| Ok(()));

    let runtime = setup_runtime(test_config(), &test_clock(), llm, weather, chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000100", "<@U123ABC> 今日の天気は？")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_other_question_routes_to_completion() {
    let mut llm = MockLlm::new();
    llm.expect_complete()
        .withf(|text| text == "Rust の所有権について教えて")
        .times(1)
        .returning(|_| Ok(completion("所有権とは、値の持ち主を一つに決める仕組みです。", FinishReason::Stop)));
    let mut weather = MockWeather::new();
    weather.expect_current_report().never();
    let mut chat = MockChat::new();
    chat.expect_send_message()
        .withf(|message| message.text == "所有権とは、値の持ち主を一つに決める仕組みです。")
        .times(1)
        .returning(|_| Ok(()));

    let runtime = setup_runtime(test_config(), &test_clock(), llm, weather, chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000200", "<@U123ABC> Rust の所有権について教えて")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_truncated_completion_gets_notice() {
    let mut llm = MockLlm::new();
    llm.expect_complete().times(1).returning(|_| Ok(completion("とても長い説明", FinishReason::Length)));
    let mut chat = MockChat::new();
    chat.expect_send_message()
        .withf(|message| message.text.starts_with("とても長い説明") && message.text.ends_with(TRUNCATION_NOTICE))
        .times(1)
        .returning(|_| Ok(()));

    let runtime = setup_runtime(test_config(), &test_clock(), llm, MockWeather::new(), chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000300", "<@U123ABC> 長文で説明して")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_duplicate_delivery_is_skipped() {
    let mut weather = MockWeather::new();
    weather.expect_current_report().times(1).returning(|| WEATHER_REPORT.to_string());
    let mut chat = MockChat::new();
    chat.expect_send_message().times(1).returning(|_| Ok(()));

    let clock = test_clock();
    let runtime = setup_runtime(test_config(), &clock, MockLlm::new(), weather, chat);
    let body = mention_body("C01TEST", "1735700000.000400", "<@U123ABC> 傘いる？");

    assert_eq!(webhook::handle_delivery(&runtime, &body).await, WebhookReply::Status(WebhookStatus::Success));

    clock.advance(chrono::Duration::seconds(599));

    assert_eq!(webhook::handle_delivery(&runtime, &body).await, WebhookReply::Status(WebhookStatus::SkippedDuplicateEvent));
}

#[tokio::test]
async fn test_redelivery_after_window_is_processed_again() {
    let mut weather = MockWeather::new();
    weather.expect_current_report().times(2).returning(|| WEATHER_REPORT.to_string());
    let mut chat = MockChat::new();
    chat.expect_send_message().times(2).returning(|_| Ok(()));

    let clock = test_clock();
    let runtime = setup_runtime(test_config(), &clock, MockLlm::new(), weather, chat);
    let body = mention_body("C01TEST", "1735700000.000500", "<@U123ABC> 雪降る？");

    assert_eq!(webhook::handle_delivery(&runtime, &body).await, WebhookReply::Status(WebhookStatus::Success));

    clock.advance(chrono::Duration::seconds(600));

    assert_eq!(webhook::handle_delivery(&runtime, &body).await, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_dedup_key_is_recorded_before_upstream_calls() {
    let mut seq = Sequence::new();

    let mut dedup = MockDedup::new();
    dedup.expect_exists().withf(|key| key == "C01TEST_1735700000.000450").times(1).in_sequence(&mut seq).returning(|_| Ok(false));
    dedup.expect_put()
        .withf(|key, ttl| key == "C01TEST_1735700000.000450" && *ttl == Duration::from_secs(600))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    let mut llm = MockLlm::new();
    llm.expect_complete().times(1).in_sequence(&mut seq).returning(|_| Ok(completion("こんにちは！", FinishReason::Stop)));
    let mut chat = MockChat::new();
    chat.expect_send_message().times(1).in_sequence(&mut seq).returning(|_| Ok(()));

    let runtime = setup_runtime_with_dedup(test_config(), DedupCache::new(Arc::new(dedup)), llm, MockWeather::new(), chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000450", "<@U123ABC> こんにちは")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_dedup_lookup_failure_is_unhandled_error() {
    let mut dedup = MockDedup::new();
    dedup.expect_exists().times(1).returning(|_| Err(anyhow!("dedup store unreachable")));
    dedup.expect_put().never();
    let mut llm = MockLlm::new();
    llm.expect_complete().never();
    let mut weather = MockWeather::new();
    weather.expect_current_report().never();
    let mut chat = MockChat::new();
    chat.expect_send_message().never();

    let runtime = setup_runtime_with_dedup(test_config(), DedupCache::new(Arc::new(dedup)), llm, weather, chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000460", "<@U123ABC> 天気は？")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::UnhandledError));
}

#[tokio::test]
async fn test_dedup_write_failure_is_unhandled_error() {
    let mut dedup = MockDedup::new();
    dedup.expect_exists().times(1).returning(|_| Ok(false));
    dedup.expect_put().times(1).returning(|_, _| Err(anyhow!("dedup store rejected write")));
    let mut llm = MockLlm::new();
    llm.expect_complete().never();
    let mut weather = MockWeather::new();
    weather.expect_current_report().never();
    let mut chat = MockChat::new();
    chat.expect_send_message().never();

    let runtime = setup_runtime_with_dedup(test_config(), DedupCache::new(Arc::new(dedup)), llm, weather, chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000470", "<@U123ABC> こんにちは")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::UnhandledError));
}

#[tokio::test]
async fn test_same_ts_in_other_channel_is_not_a_duplicate() {
    let mut weather = MockWeather::new();
    weather.expect_current_report().times(2).returning(|| WEATHER_REPORT.to_string());
    let mut chat = MockChat::new();
    chat.expect_send_message().times(2).returning(|_| Ok(()));

    let runtime = setup_runtime(test_config(), &test_clock(), MockLlm::new(), weather, chat);

    let first = webhook::handle_delivery(&runtime, &mention_body("C01", "1735700000.000600", "<@U1> 天気")).await;
    let second = webhook::handle_delivery(&runtime, &mention_body("C02", "1735700000.000600", "<@U1> 天気")).await;

    assert_eq!(first, WebhookReply::Status(WebhookStatus::Success));
    assert_eq!(second, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_upstream_error_posts_apology() {
    let mut llm = MockLlm::new();
    llm.expect_complete().times(1).returning(|_| Err(RelayError::upstream_status("llm", 503, "Service Unavailable")));
    let mut chat = MockChat::new();
    chat.expect_send_message()
        .withf(|message| message.text == APOLOGY_REPLY && message.thread_ts.as_deref() == Some("1735700000.000700"))
        .times(1)
        .returning(|_| Ok(()));

    let runtime = setup_runtime(test_config(), &test_clock(), llm, MockWeather::new(), chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000700", "<@U123ABC> こんにちは")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_malformed_upstream_reply_posts_apology() {
    let mut llm = MockLlm::new();
    llm.expect_complete().times(1).returning(|_| Err(RelayError::upstream_malformed("llm", r#"{"choices":[]}"#)));
    let mut chat = MockChat::new();
    chat.expect_send_message().withf(|message| message.text == APOLOGY_REPLY).times(1).returning(|_| Ok(()));

    let runtime = setup_runtime(test_config(), &test_clock(), llm, MockWeather::new(), chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000750", "<@U123ABC> こんにちは")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_post_failure_is_swallowed() {
    let mut weather = MockWeather::new();
    weather.expect_current_report().times(1).returning(|| WEATHER_REPORT.to_string());
    let mut chat = MockChat::new();
    chat.expect_send_message().times(1).returning(|_| Err(RelayError::Post("channel_not_found".to_string())));

    let runtime = setup_runtime(test_config(), &test_clock(), MockLlm::new(), weather, chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000800", "<@U123ABC> 気温は？")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_empty_mention_sends_nothing() {
    let mut llm = MockLlm::new();
    llm.expect_complete().never();
    let mut chat = MockChat::new();
    chat.expect_send_message().never();

    let runtime = setup_runtime(test_config(), &test_clock(), llm, MockWeather::new(), chat);
    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.000900", "<@U123ABC>   ")).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_non_mention_events_do_no_work() {
    let mut chat = MockChat::new();
    chat.expect_send_message().never();

    let runtime = setup_runtime(test_config(), &test_clock(), MockLlm::new(), MockWeather::new(), chat);
    let body = json!({
        "type": "event_callback",
        "event": { "type": "message", "text": "天気いいね", "channel": "C01TEST", "ts": "1735700000.001000" }
    })
    .to_string();

    let reply = webhook::handle_delivery(&runtime, body.as_bytes()).await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::Success));
}

#[tokio::test]
async fn test_missing_secrets_returns_config_error() {
    let mut weather = MockWeather::new();
    weather.expect_current_report().never();
    let mut chat = MockChat::new();
    chat.expect_send_message().never();

    let config = Config::from(ConfigInner {
        llm_api_key: "gsk-test".to_string(),
        slack_bot_token: "xoxb-test".to_string(),
        ..Default::default()
    });
    let runtime = setup_runtime(config, &test_clock(), MockLlm::new(), weather, chat);

    let reply = webhook::handle_delivery(&runtime, &mention_body("C01TEST", "1735700000.001100", "<@U123ABC> 天気は？")).await;

    assert_eq!(reply, WebhookReply::ConfigError);
}

#[tokio::test]
async fn test_malformed_body_is_unhandled_error() {
    let runtime = setup_runtime(test_config(), &test_clock(), MockLlm::new(), MockWeather::new(), MockChat::new());

    let reply = webhook::handle_delivery(&runtime, b"{not json").await;

    assert_eq!(reply, WebhookReply::Status(WebhookStatus::UnhandledError));
}

#[tokio::test]
async fn test_http_surface_always_answers_200() {
    let runtime = setup_runtime(test_config(), &test_clock(), MockLlm::new(), MockWeather::new(), MockChat::new());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, webhook::router(runtime)).await;
    });

    let client = reqwest::Client::new();
    let events_url = format!("http://{addr}/slack/events");

    // Handshake is echoed as the raw body.
    let response = client.post(&events_url).body(r#"{"type":"url_verification","challenge":"xyz"}"#).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "xyz");

    // Garbage still gets a 200 with a status body.
    let response = client.post(&events_url).body("garbage").send().await.unwrap();
    assert_eq!(response.status(), 200);
    let status: serde_json::Value = response.json().await.unwrap();
    assert_eq!(status, json!({ "status": "unhandled_error_in_gas" }));

    // Liveness.
    let response = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    server.abort();
}
