//! Keyword routing between the weather and completion paths.

/// Terms that mark a message as a weather question.
pub const WEATHER_KEYWORDS: &[&str] = &["天気", "雨", "雪", "晴れ", "曇り", "降水", "気温", "予報", "傘"];

/// Which upstream should answer a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Weather,
    Completion,
}

/// Classify a message by plain substring membership.
///
/// Matching is case-sensitive and ignores negation: "雨は降らない？" is still a
/// weather question.
pub fn classify(text: &str) -> Intent {
    if is_weather_query(text) { Intent::Weather } else { Intent::Completion }
}

pub fn is_weather_query(text: &str) -> bool {
    WEATHER_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}
