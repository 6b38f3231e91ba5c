use crate::clients::error::AviationWeatherError;
use crate::types::geo::LatLon;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateStationError {
    #[error("Cannot search for stations within {radius_miles} mi of {center}")]
    InvalidQuery { center: LatLon, radius_miles: f64 },

    #[error("Station lookup failed")]
    Source(#[from] AviationWeatherError),
}

impl LocateStationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LocateStationError::Source(e) if e.is_cancelled())
    }
}
