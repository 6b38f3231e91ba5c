//! HTTP client for the aviationweather.gov data API.

use crate::clients::error::AviationWeatherError;
use crate::clients::source::{ObservationSource, StationSource};
use crate::config::PipelineConfig;
use crate::observations::window::ObservationWindow;
use crate::types::geo::BoundingBox;
use crate::types::observation::Observation;
use crate::types::station::{StationFeatureCollection, StationInfo};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use tokio_util::sync::CancellationToken;

const STATION_INFO_PATH: &str = "/api/data/stationinfo";
const METAR_PATH: &str = "/api/data/metar";

/// Client for the station-metadata and METAR endpoints.
#[derive(Debug, Clone)]
pub struct AviationWeatherClient {
    client: Client,
    base_url: String,
}

impl AviationWeatherClient {
    pub fn new(config: &PipelineConfig) -> Result<Self, AviationWeatherError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(AviationWeatherError::ClientBuild)?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    /// Endpoint URL with the non-empty `params` as query pairs.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, AviationWeatherError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| AviationWeatherError::UnexpectedPayload {
            url: raw.clone(),
            message: format!("invalid URL: {e}"),
        })?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                let value = value.trim();
                if !value.is_empty() {
                    query.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    /// GETs `url` and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AviationWeatherError> {
        let url_str = url.to_string();
        info!("Requesting {}", url_str);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AviationWeatherError::NetworkRequest(url_str.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Request to {} failed: {}", url_str, e);
                return if let Some(status) = e.status() {
                    Err(AviationWeatherError::HttpStatus {
                        url: url_str,
                        status,
                        source: e,
                    })
                } else {
                    Err(AviationWeatherError::NetworkRequest(url_str, e))
                };
            }
        };
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AviationWeatherError::NetworkRequest(url_str.clone(), e))?;
        // The METAR endpoint answers 204 with an empty body when nothing matched.
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| AviationWeatherError::JsonParse(url_str, e))
    }
}

/// Races `request` against `cancel`, resolving to `Cancelled` if the token fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    request: impl Future<Output = Result<T, AviationWeatherError>>,
) -> Result<T, AviationWeatherError> {
    if cancel.is_cancelled() {
        return Err(AviationWeatherError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AviationWeatherError::Cancelled),
        result = request => result,
    }
}

#[async_trait]
impl StationSource for AviationWeatherClient {
    async fn stations_in_bbox(
        &self,
        bbox: &BoundingBox,
        cancel: &CancellationToken,
    ) -> Result<Vec<StationInfo>, AviationWeatherError> {
        let url = self.endpoint(
            STATION_INFO_PATH,
            &[("bbox", bbox.to_string()), ("format", "geojson".to_string())],
        )?;
        let collection: Option<StationFeatureCollection> =
            cancellable(cancel, self.get_json(url)).await?;
        Ok(collection.unwrap_or_default().into_stations())
    }
}

#[async_trait]
impl ObservationSource for AviationWeatherClient {
    async fn observations(
        &self,
        station_id: &str,
        window: &ObservationWindow,
        cancel: &CancellationToken,
    ) -> Result<Vec<Observation>, AviationWeatherError> {
        debug!(
            "Observations of {} from {} to {}",
            station_id,
            window.start().format("%Y-%m-%dT%H:%M:%SZ"),
            window.end_iso()
        );
        let url = self.endpoint(
            METAR_PATH,
            &[
                ("ids", station_id.to_string()),
                ("format", "json".to_string()),
                ("hours", window.hours.to_string()),
                ("date", window.end_iso()),
            ],
        )?;
        let url_str = url.to_string();
        let payload: Value = cancellable(cancel, self.get_json(url)).await?;
        match payload {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<Observation>(item).ok())
                .collect()),
            other => Err(AviationWeatherError::UnexpectedPayload {
                url: url_str,
                message: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client() -> AviationWeatherClient {
        let config = PipelineConfig::builder()
            .base_url("https://aviationweather.gov/".to_string())
            .build();
        AviationWeatherClient::new(&config).unwrap()
    }

    #[test]
    fn test_metar_url() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let window = ObservationWindow::for_count_day(date, -122.0, 30).unwrap();
        let url = client()
            .endpoint(
                METAR_PATH,
                &[
                    ("ids", "KSFO".to_string()),
                    ("format", "json".to_string()),
                    ("hours", window.hours.to_string()),
                    ("date", window.end_iso()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://aviationweather.gov/api/data/metar?ids=KSFO&format=json&hours=30&date=2024-12-22T07%3A59%3A59Z"
        );
    }

    #[test]
    fn test_empty_params_are_dropped() {
        let url = client()
            .endpoint(
                STATION_INFO_PATH,
                &[("bbox", "1,2,3,4".to_string()), ("extra", "  ".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://aviationweather.gov/api/data/stationinfo?bbox=1%2C2%2C3%2C4"
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = cancellable(&cancel, async { Ok::<_, AviationWeatherError>(1) }).await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_request() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move { trigger.cancel() });
        let pending = std::future::pending::<Result<(), AviationWeatherError>>();
        assert!(cancellable(&cancel, pending).await.unwrap_err().is_cancelled());
    }
}
