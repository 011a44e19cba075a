pub mod yahoo;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

// Constants.

/// Most forecast points included in a report.
pub const MAX_FORECAST_POINTS: usize = 11;

/// Timestamp layout used by the provider (`YYYYMMDDHHMM`).
pub const PROVIDER_DATE_FORMAT: &str = "%Y%m%d%H%M";

const DISPLAY_DATE_FORMAT: &str = "%-m月%-d日 %H:%M";

const FORECAST_HEADER: &str = "【この先の降水予報（10分ごと）】";
const NO_PRECIPITATION_NOTE: &str = "この先しばらく雨の心配はなさそうです。";
const NO_FORECAST_NOTE: &str = "予報データがありません。";

// Traits.

/// Generic weather client trait that clients must implement.
///
/// Implementations answer for a fixed, configured location and always return
/// some text: failures are described in the returned string rather than raised.
#[async_trait]
pub trait GenericWeatherClient: Send + Sync + 'static {
    /// Current rainfall plus the short-range forecast, formatted for chat.
    async fn current_report(&self) -> String;
}

// Structs.

/// Weather client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct WeatherClient {
    inner: Arc<dyn GenericWeatherClient>,
}

impl Deref for WeatherClient {
    type Target = dyn GenericWeatherClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl WeatherClient {
    pub fn new(inner: Arc<dyn GenericWeatherClient>) -> Self {
        Self { inner }
    }
}

// Forecast model.

/// One point in time with its rainfall rate.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    /// Provider timestamp, `YYYYMMDDHHMM` in local time.
    pub date: String,
    /// Rainfall in mm/h.
    pub rainfall: f64,
}

/// An observation followed by the forecast points still ahead of "now".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherForecast {
    pub observation: Option<ForecastPoint>,
    pub forecasts: Vec<ForecastPoint>,
}

impl WeatherForecast {
    /// Keep the forecast points strictly later than `now_stamp`, at most [`MAX_FORECAST_POINTS`].
    ///
    /// `now_stamp` is in the provider's `YYYYMMDDHHMM` form. The layout is
    /// fixed-width and zero-padded, so string order is time order.
    pub fn new(observation: Option<ForecastPoint>, candidates: impl IntoIterator<Item = ForecastPoint>, now_stamp: &str) -> Self {
        let forecasts = candidates.into_iter().filter(|point| point.date.as_str() > now_stamp).take(MAX_FORECAST_POINTS).collect();

        Self { observation, forecasts }
    }

    /// Render the report as chat text.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        if let Some(observation) = &self.observation {
            sections.push(format!("現在（{}）の降水強度: {} mm/h", display_date(&observation.date), observation.rainfall));
        }

        let mut forecast_lines = vec![FORECAST_HEADER.to_string()];

        if self.forecasts.is_empty() {
            let dry_now = self.observation.as_ref().is_some_and(|observation| observation.rainfall == 0.0);
            forecast_lines.push(if dry_now { NO_PRECIPITATION_NOTE } else { NO_FORECAST_NOTE }.to_string());
        } else {
            forecast_lines.extend(self.forecasts.iter().map(|point| format!("{}: {} mm/h", display_date(&point.date), point.rainfall)));
        }

        sections.push(forecast_lines.join("\n"));
        sections.join("\n\n")
    }
}

/// Format an instant as the provider's `YYYYMMDDHHMM` in the given offset.
pub fn provider_stamp(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset).format(PROVIDER_DATE_FORMAT).to_string()
}

/// `202501011210` -> `1月1日 12:10`; anything unparseable is shown as-is.
pub fn display_date(stamp: &str) -> String {
    NaiveDateTime::parse_from_str(stamp, PROVIDER_DATE_FORMAT).map(|date| date.format(DISPLAY_DATE_FORMAT).to_string()).unwrap_or_else(|_| stamp.to_string())
}
