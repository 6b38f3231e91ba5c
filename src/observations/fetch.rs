use crate::clients::source::ObservationSource;
use crate::observations::aggregate::aggregate_count_day_observations;
use crate::observations::error::ObservationFetchError;
use crate::observations::window::ObservationWindow;
use crate::types::report::CountDayReconstruction;
use crate::types::station::Station;
use chrono::NaiveDate;
use log::info;
use tokio_util::sync::CancellationToken;

/// Fetches the observations of `station` around `date` and reconstructs the
/// count day from them.
///
/// No past-date check happens here; callers decide whether a date is eligible.
pub async fn fetch_count_day(
    source: &dyn ObservationSource,
    station: &Station,
    date: NaiveDate,
    lookback_hours: u32,
    cancel: &CancellationToken,
) -> Result<CountDayReconstruction, ObservationFetchError> {
    let longitude = station.longitude();
    let window = ObservationWindow::for_count_day(date, longitude, lookback_hours)
        .ok_or(ObservationFetchError::InvalidWindow { date, longitude })?;

    let observations = source
        .observations(station.id(), &window, cancel)
        .await
        .map_err(|source| ObservationFetchError::Source {
            station_id: station.id().to_string(),
            source,
        })?;

    let reconstruction = aggregate_count_day_observations(&observations, date, longitude);
    info!(
        "Station {} returned {} observations, {} inside {}",
        station.id(),
        observations.len(),
        reconstruction.used_count,
        date
    );
    Ok(reconstruction)
}
