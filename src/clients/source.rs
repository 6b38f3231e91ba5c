//! The two network services the count-day pipeline depends on.
//!
//! [`AviationWeatherClient`](crate::AviationWeatherClient) implements both against
//! aviationweather.gov; tests substitute in-process fakes.

use crate::clients::error::AviationWeatherError;
use crate::observations::window::ObservationWindow;
use crate::types::geo::BoundingBox;
use crate::types::observation::Observation;
use crate::types::station::StationInfo;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Station-metadata lookup.
#[async_trait]
pub trait StationSource: Send + Sync {
    /// All stations inside `bbox`. Resolves to
    /// [`AviationWeatherError::Cancelled`] once `cancel` fires.
    async fn stations_in_bbox(
        &self,
        bbox: &BoundingBox,
        cancel: &CancellationToken,
    ) -> Result<Vec<StationInfo>, AviationWeatherError>;
}

/// Raw observation history lookup.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Observations of `station_id` inside `window`, in no particular order.
    /// Resolves to [`AviationWeatherError::Cancelled`] once `cancel` fires.
    async fn observations(
        &self,
        station_id: &str,
        window: &ObservationWindow,
        cancel: &CancellationToken,
    ) -> Result<Vec<Observation>, AviationWeatherError>;
}

/// A backend offering both services.
pub trait AviationWeatherSource: StationSource + ObservationSource {
    fn as_station_source(&self) -> &dyn StationSource;
    fn as_observation_source(&self) -> &dyn ObservationSource;
}

impl<T: StationSource + ObservationSource> AviationWeatherSource for T {
    fn as_station_source(&self) -> &dyn StationSource {
        self
    }

    fn as_observation_source(&self) -> &dyn ObservationSource {
        self
    }
}
