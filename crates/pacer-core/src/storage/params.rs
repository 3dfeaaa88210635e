//! URL-style launch parameters for a breathing session.
//!
//! Accepts `sec`, `pattern`, `back_url` and `back_label`. Every parameter is
//! validated on its own; a bad value falls back to its default and is
//! reported in `fallbacks` instead of failing the whole launch.

use url::Url;

use super::config::SessionConfig;
use crate::clock::BreathingPattern;
use crate::error::ValidationError;

pub const DEFAULT_BACK_LABEL: &str = "Back";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub total_secs: u32,
    pub pattern: BreathingPattern,
    /// Only absolute http(s) URLs are kept.
    pub back_url: Option<Url>,
    pub back_label: String,
    /// Parameters that were present but unusable, in query order.
    pub fallbacks: Vec<ValidationError>,
}

impl SessionParams {
    pub fn defaults(config: &SessionConfig) -> Self {
        Self {
            total_secs: config.default_secs,
            pattern: BreathingPattern::parse_or_default(&config.pattern),
            back_url: None,
            back_label: DEFAULT_BACK_LABEL.to_string(),
            fallbacks: Vec::new(),
        }
    }

    /// Parse a query string (`sec=30&pattern=4-7-8`, with or without a
    /// leading `?`) or a full URL carrying one.
    pub fn from_query(input: &str, config: &SessionConfig) -> Self {
        let query = match Url::parse(input) {
            Ok(url) => url.query().unwrap_or_default().to_string(),
            Err(_) => input.trim_start_matches('?').to_string(),
        };

        let mut params = Self::defaults(config);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let result = match key.as_ref() {
                "sec" => parse_secs(&value, config).map(|secs| params.total_secs = secs),
                "pattern" => value
                    .parse::<BreathingPattern>()
                    .map(|pattern| params.pattern = pattern),
                "back_url" => parse_back_url(&value).map(|url| params.back_url = Some(url)),
                "back_label" => {
                    if !value.trim().is_empty() {
                        params.back_label = value.trim().to_string();
                    }
                    Ok(())
                }
                other => {
                    tracing::debug!(key = other, "ignoring unknown session parameter");
                    Ok(())
                }
            };
            if let Err(err) = result {
                tracing::debug!("session parameter fell back to default: {err}");
                params.fallbacks.push(err);
            }
        }
        params
    }
}

fn parse_secs(value: &str, config: &SessionConfig) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        field: "sec".into(),
        message: format!(
            "expected {}-{} seconds (got '{value}')",
            config.min_secs, config.max_secs
        ),
    };
    let secs = value.trim().parse::<u32>().map_err(|_| invalid())?;
    if !(config.min_secs..=config.max_secs).contains(&secs) {
        return Err(invalid());
    }
    Ok(secs)
}

fn parse_back_url(value: &str) -> Result<Url, ValidationError> {
    let invalid = |message: &str| ValidationError::InvalidValue {
        field: "back_url".into(),
        message: message.to_string(),
    };
    let url = Url::parse(value.trim()).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid("only http and https links are allowed")),
    }
}
