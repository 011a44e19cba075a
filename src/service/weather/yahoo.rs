//! Yahoo! JAPAN YOLP weather client.
//!
//! Asks the YOLP place weather API for the configured coordinates and turns the
//! observation and 10-minute forecasts into a chat-ready report.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::FixedOffset;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::base::{
    clock::{Clock, SystemClock},
    config::Config,
    error::excerpt,
    types::Res,
};

use super::{ForecastPoint, GenericWeatherClient, WeatherClient, WeatherForecast, provider_stamp};

/// Longest body excerpt embedded in a failure reply.
const ERROR_EXCERPT_CHARS: usize = 200;

/// YOLP reports local (JST) timestamps.
const JST_OFFSET_SECS: i32 = 9 * 3600;

const NO_DATA_REPLY: &str = "天気情報を取得できませんでした。";
const UNEXPECTED_ERROR_REPLY: &str = "天気情報の取得中に予期しないエラーが発生しました。";

// Extra methods on `WeatherClient` applied by the yahoo implementation.

impl WeatherClient {
    pub fn yahoo(config: &Config) -> Self {
        let client = YahooWeatherClient::new(config, Arc::new(SystemClock));
        Self { inner: Arc::new(client) }
    }
}

// Wire types.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct YolpResponse {
    #[serde(default)]
    feature: Vec<YolpFeature>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct YolpFeature {
    property: YolpProperty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct YolpProperty {
    weather_list: YolpWeatherList,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct YolpWeatherList {
    #[serde(default)]
    weather: Vec<YolpWeather>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct YolpWeather {
    #[serde(rename = "Type")]
    kind: String,
    date: String,
    rainfall: f64,
}

impl From<YolpWeather> for ForecastPoint {
    fn from(weather: YolpWeather) -> Self {
        ForecastPoint {
            date: weather.date,
            rainfall: weather.rainfall,
        }
    }
}

// Specific implementations.

/// YOLP weather client implementation.
#[derive(Clone)]
pub struct YahooWeatherClient {
    http: reqwest::Client,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl YahooWeatherClient {
    /// Create a new YOLP weather client.
    #[instrument(name = "YahooWeatherClient::new", skip_all)]
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
            clock,
        }
    }

    /// Fetch and format the report; `Err` only for transport or decoding failures.
    async fn fetch_report(&self) -> Res<String> {
        let response = self
            .http
            .get(&self.config.weather_api_url)
            .query(&[
                ("appid", self.config.weather_app_id.as_str()),
                ("coordinates", self.config.weather_coordinates.as_str()),
                ("output", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        info!("Weather response status: {}", status.as_u16());

        if status != reqwest::StatusCode::OK {
            let snippet = excerpt(&body, ERROR_EXCERPT_CHARS);
            error!("Weather request failed: {} - {}", status.as_u16(), snippet);
            return Ok(format!("天気情報の取得に失敗しました（ステータスコード: {}）。\n{}", status.as_u16(), snippet));
        }

        let parsed: YolpResponse = serde_json::from_str(&body)?;

        let Some(feature) = parsed.feature.into_iter().next() else {
            warn!("Weather response carried no feature data.");
            return Ok(NO_DATA_REPLY.to_string());
        };

        let jst = FixedOffset::east_opt(JST_OFFSET_SECS).ok_or_else(|| anyhow::anyhow!("Invalid JST offset."))?;
        let now_stamp = provider_stamp(self.clock.now(), jst);

        Ok(build_forecast(feature.property.weather_list.weather, &now_stamp).render())
    }
}

#[async_trait]
impl GenericWeatherClient for YahooWeatherClient {
    #[instrument(name = "YahooWeatherClient::current_report", skip_all)]
    async fn current_report(&self) -> String {
        match self.fetch_report().await {
            Ok(report) => report,
            Err(err) => {
                error!("Unexpected error while fetching weather: {}", err);
                UNEXPECTED_ERROR_REPLY.to_string()
            }
        }
    }
}

/// Split the provider's list into the observation and the forecast candidates.
fn build_forecast(entries: Vec<YolpWeather>, now_stamp: &str) -> WeatherForecast {
    let mut observation = None;
    let mut candidates = Vec::new();

    for entry in entries {
        match entry.kind.as_str() {
            "observation" if observation.is_none() => observation = Some(entry.into()),
            "forecast" => candidates.push(ForecastPoint::from(entry)),
            _ => {}
        }
    }

    WeatherForecast::new(observation, candidates, now_stamp)
}

// Tests.
