//! Settings shared by the network client and the count-day pipeline.

use bon::Builder;
use std::time::Duration;

/// Default aviation weather service root.
pub const DEFAULT_BASE_URL: &str = "https://aviationweather.gov";
/// Environment variable overriding [`PipelineConfig::base_url`], e.g. to go
/// through a CORS relay or a local proxy.
pub const BASE_URL_ENV_VAR: &str = "CBC_WEATHER_AWC_BASE_URL";

/// Configuration of the count-day reconstruction pipeline.
///
/// ```
/// use cbc_weather::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .base_url("http://localhost:8080/awc/".to_string())
///     .station_radius_miles(20.0)
///     .build();
/// assert_eq!(config.base_url(), "http://localhost:8080/awc");
/// assert_eq!(config.lookback_hours, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PipelineConfig {
    #[builder(default = DEFAULT_BASE_URL.to_string())]
    base_url: String,
    /// Search radius around a circle centre when looking for a station. This is
    /// independent of the circle's own buffer radius.
    #[builder(default = 15.0)]
    pub station_radius_miles: f64,
    /// Length of observation history requested, ending at local 23:59:59 of the
    /// count date.
    #[builder(default = 30)]
    pub lookback_hours: u32,
    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,
    #[builder(default = format!("cbc-weather/{}", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PipelineConfig {
    /// Defaults, with the base URL taken from `CBC_WEATHER_AWC_BASE_URL` when set.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => {
                Self::builder().base_url(url.trim().to_string()).build()
            }
            _ => Self::default(),
        }
    }

    /// Service root without a trailing `/`.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.station_radius_miles, 15.0);
        assert_eq!(config.lookback_hours, 30);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("cbc-weather/"));
    }
}
