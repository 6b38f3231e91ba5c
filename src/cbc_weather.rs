//! Main entry point: one-shot station lookups and count-day reconstructions, plus
//! access to the interactive orchestrator, the circle index and the report store.

use crate::circles::error::CircleIndexError;
use crate::circles::index::CircleIndex;
use crate::clients::aviation_weather::AviationWeatherClient;
use crate::config::PipelineConfig;
use crate::error::CbcWeatherError;
use crate::observations::error::ObservationFetchError;
use crate::observations::fetch::fetch_count_day;
use crate::orchestrator::CountDayOrchestrator;
use crate::reports::store::{ReportStore, REPORT_STORE_FILE_NAME};
use crate::stations::locate_station::find_nearest_observing_station;
use crate::types::geo::LatLon;
use crate::types::report::CountDayReconstruction;
use crate::types::station::Station;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Client for reconstructing Christmas Bird Count day weather.
///
/// Create one with [`CbcWeather::new()`] (defaults, base URL overridable through
/// the environment) or [`CbcWeather::from_config()`].
///
/// # Examples
///
/// ```rust,no_run
/// # use cbc_weather::{CbcWeather, CbcWeatherError};
/// # async fn run() -> Result<(), CbcWeatherError> {
/// let weather = CbcWeather::new()?;
/// # Ok(())
/// # }
/// ```
pub struct CbcWeather {
    client: Arc<AviationWeatherClient>,
    config: PipelineConfig,
}

#[bon]
impl CbcWeather {
    /// Creates a client from [`PipelineConfig::from_env()`].
    ///
    /// # Errors
    ///
    /// Returns [`CbcWeatherError::AviationWeather`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CbcWeatherError> {
        Self::from_config(PipelineConfig::from_env())
    }

    /// Creates a client with an explicit configuration.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use cbc_weather::{CbcWeather, CbcWeatherError, PipelineConfig};
    /// # fn run() -> Result<(), CbcWeatherError> {
    /// let config = PipelineConfig::builder()
    ///     .base_url("http://localhost:8787".to_string())
    ///     .lookback_hours(36)
    ///     .build();
    /// let weather = CbcWeather::from_config(config)?;
    /// assert_eq!(weather.config().lookback_hours, 36);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: PipelineConfig) -> Result<Self, CbcWeatherError> {
        let client = AviationWeatherClient::new(&config)?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Finds the nearest station that publishes observation reports.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.center(LatLon)`: **Required.** Point to search around.
    /// * `.radius_miles(f64)`: Optional. Defaults to the configured station radius (15 mi).
    /// * `.cancel(CancellationToken)`: Optional. Cancels the request when triggered.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no observing station lies within the radius.
    ///
    /// # Errors
    ///
    /// Returns [`CbcWeatherError::LocateStation`] for an invalid query or a
    /// failed station-metadata request.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use cbc_weather::{CbcWeather, CbcWeatherError, LatLon};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), CbcWeatherError> {
    /// let weather = CbcWeather::new()?;
    /// let station = weather
    ///     .find_station()
    ///     .center(LatLon(38.07, -122.88))
    ///     .call()
    ///     .await?;
    /// if let Some(station) = station {
    ///     println!("{}", station.describe());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn find_station(
        &self,
        center: LatLon,
        radius_miles: Option<f64>,
        cancel: Option<CancellationToken>,
    ) -> Result<Option<Station>, CbcWeatherError> {
        let radius_miles = radius_miles.unwrap_or(self.config.station_radius_miles);
        let cancel = cancel.unwrap_or_default();
        let station =
            find_nearest_observing_station(self.client.as_ref(), center, radius_miles, &cancel)
                .await?;
        Ok(station)
    }

    /// Reconstructs the weather of one count day from a station's reports.
    ///
    /// # Arguments
    ///
    /// * `.station(&Station)`: **Required.**
    /// * `.date(NaiveDate)`: **Required.** Must lie before `today`.
    /// * `.lookback_hours(u32)`: Optional. Defaults to the configured window (30 h).
    /// * `.today(NaiveDate)`: Optional. Defaults to the local date.
    /// * `.cancel(CancellationToken)`: Optional.
    ///
    /// # Errors
    ///
    /// Returns [`CbcWeatherError::ObservationFetch`] when the date is not in the
    /// past or the observation request fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use cbc_weather::{CbcWeather, CbcWeatherError, LatLon};
    /// # use chrono::NaiveDate;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), CbcWeatherError> {
    /// let weather = CbcWeather::new()?;
    /// let Some(station) = weather.find_station().center(LatLon(38.07, -122.88)).call().await? else {
    ///     return Ok(());
    /// };
    /// let reconstruction = weather
    ///     .count_day_observations()
    ///     .station(&station)
    ///     .date(NaiveDate::from_ymd_opt(2024, 12, 21).unwrap())
    ///     .call()
    ///     .await?;
    /// println!("{} reports used", reconstruction.used_count);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn count_day_observations(
        &self,
        station: &Station,
        date: NaiveDate,
        lookback_hours: Option<u32>,
        today: Option<NaiveDate>,
        cancel: Option<CancellationToken>,
    ) -> Result<CountDayReconstruction, CbcWeatherError> {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        if date >= today {
            return Err(ObservationFetchError::DateNotInPast(date).into());
        }
        let lookback_hours = lookback_hours.unwrap_or(self.config.lookback_hours);
        let cancel = cancel.unwrap_or_default();
        let reconstruction =
            fetch_count_day(self.client.as_ref(), station, date, lookback_hours, &cancel).await?;
        Ok(reconstruction)
    }

    /// A fresh orchestrator sharing this client's HTTP connection pool.
    pub fn orchestrator(&self) -> CountDayOrchestrator {
        CountDayOrchestrator::new(self.client.clone(), self.config.clone())
    }

    /// Loads the circle dataset from a local GeoJSON file (optionally gzipped) or
    /// from a URL, whose parsed form is cached as a snapshot.
    ///
    /// # Arguments
    ///
    /// * `.path(PathBuf)` or `.url(&str)`: one of them is required; `path` wins.
    /// * `.cache_folder(PathBuf)`: Optional. Defaults to the user cache directory.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use cbc_weather::{CbcWeather, CbcWeatherError, LatLon};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), CbcWeatherError> {
    /// let weather = CbcWeather::new()?;
    /// let circles = weather
    ///     .circles()
    ///     .path("data/cbc_circles.geojson.gz".into())
    ///     .call()
    ///     .await?;
    /// for circle in circles.search("point reyes") {
    ///     println!("{}", circle.label());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn circles(
        &self,
        path: Option<PathBuf>,
        url: Option<&str>,
        cache_folder: Option<PathBuf>,
    ) -> Result<CircleIndex, CbcWeatherError> {
        if let Some(path) = path {
            return Ok(CircleIndex::load_file(&path).await?);
        }
        let url = url.ok_or(CircleIndexError::MissingSource)?;
        let cache_folder = match cache_folder {
            Some(folder) => folder,
            None => get_cache_dir()?,
        };
        ensure_cache_dir_exists(&cache_folder).await?;
        Ok(CircleIndex::load_url(url, &cache_folder).await?)
    }

    /// Opens the saved-report store.
    ///
    /// # Arguments
    ///
    /// * `.path(PathBuf)`: Optional. Defaults to
    ///   `<user cache dir>/cbc_weather_cache/count_day_reports.json`.
    #[builder]
    pub async fn report_store(&self, path: Option<PathBuf>) -> Result<ReportStore, CbcWeatherError> {
        let path = match path {
            Some(path) => path,
            None => {
                let cache_folder = get_cache_dir()?;
                ensure_cache_dir_exists(&cache_folder).await?;
                cache_folder.join(REPORT_STORE_FILE_NAME)
            }
        };
        Ok(ReportStore::open(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::StationInfo;

    fn station() -> Station {
        Station {
            info: StationInfo {
                id: "KDVO".into(),
                site: "Novato/Gnoss Fld".into(),
                latitude: 38.14,
                longitude: -122.56,
                site_types: vec!["METAR".into()],
            },
            distance_miles: 3.0,
        }
    }

    #[tokio::test]
    async fn test_count_day_must_be_in_the_past() {
        let weather = CbcWeather::from_config(PipelineConfig::default()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let result = weather
            .count_day_observations()
            .station(&station())
            .date(date)
            .today(date)
            .call()
            .await;
        assert!(matches!(
            result,
            Err(CbcWeatherError::ObservationFetch(
                ObservationFetchError::DateNotInPast(d)
            )) if d == date
        ));
    }

    #[tokio::test]
    async fn test_report_store_at_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let weather = CbcWeather::from_config(PipelineConfig::default()).unwrap();
        let store = weather
            .report_store()
            .path(dir.path().join("reports.json"))
            .call()
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_circles_need_a_source() {
        let weather = CbcWeather::from_config(PipelineConfig::default()).unwrap();
        let result = weather.circles().call().await;
        assert!(matches!(result, Err(CbcWeatherError::CircleIndex(_))));
    }
}
