use crate::circles::error::CircleIndexError;
use crate::clients::error::AviationWeatherError;
use crate::observations::error::ObservationFetchError;
use crate::reports::error::ReportStoreError;
use crate::stations::error::LocateStationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CbcWeatherError {
    #[error(transparent)]
    AviationWeather(#[from] AviationWeatherError),

    #[error(transparent)]
    LocateStation(#[from] LocateStationError),

    #[error(transparent)]
    ObservationFetch(#[from] ObservationFetchError),

    #[error(transparent)]
    CircleIndex(#[from] CircleIndexError),

    #[error(transparent)]
    ReportStore(#[from] ReportStoreError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}

impl CbcWeatherError {
    /// Whether the error only reports a superseded, cancelled request.
    pub fn is_cancelled(&self) -> bool {
        match self {
            CbcWeatherError::AviationWeather(e) => e.is_cancelled(),
            CbcWeatherError::LocateStation(e) => e.is_cancelled(),
            CbcWeatherError::ObservationFetch(e) => e.is_cancelled(),
            _ => false,
        }
    }
}
