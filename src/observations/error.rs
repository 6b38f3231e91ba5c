use crate::clients::error::AviationWeatherError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationFetchError {
    #[error("Count date {0} is not in the past")]
    DateNotInPast(NaiveDate),

    #[error("Cannot build an observation window for {date} at longitude {longitude}")]
    InvalidWindow { date: NaiveDate, longitude: f64 },

    #[error("Observation request for station {station_id} failed")]
    Source {
        station_id: String,
        #[source]
        source: AviationWeatherError,
    },
}

impl ObservationFetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ObservationFetchError::Source { source, .. } if source.is_cancelled())
    }
}
