use crate::clients::source::StationSource;
use crate::stations::error::LocateStationError;
use crate::types::geo::{BoundingBox, LatLon};
use crate::types::station::{Station, StationInfo};
use log::{debug, info};
use ordered_float::OrderedFloat;
use tokio_util::sync::CancellationToken;

/// Ranks candidate stations by great-circle distance from `center`.
///
/// Stations farther than `radius_miles` are dropped; the bounding box a source
/// answers for is only a superset of the search circle. The result is sorted
/// nearest first.
pub fn rank_stations(center: LatLon, radius_miles: f64, candidates: Vec<StationInfo>) -> Vec<Station> {
    let mut ranked: Vec<Station> = candidates
        .into_iter()
        .filter_map(|info| {
            let distance_miles = center.distance_miles(info.location())?;
            if distance_miles > radius_miles {
                return None;
            }
            Some(Station {
                info,
                distance_miles,
            })
        })
        .collect();
    ranked.sort_by_key(|station| OrderedFloat(station.distance_miles));
    ranked
}

/// Picks the nearest station that issues METARs, falling back to the nearest
/// station of any kind.
pub fn select_station(ranked: &[Station]) -> Option<&Station> {
    ranked
        .iter()
        .find(|station| station.info.has_metar())
        .or_else(|| ranked.first())
}

/// All stations within `radius_miles` of `center`, nearest first.
pub async fn stations_within(
    source: &dyn StationSource,
    center: LatLon,
    radius_miles: f64,
    cancel: &CancellationToken,
) -> Result<Vec<Station>, LocateStationError> {
    let bbox = BoundingBox::around(center, radius_miles)
        .filter(|_| radius_miles >= 0.0)
        .ok_or(LocateStationError::InvalidQuery {
            center,
            radius_miles,
        })?;

    let candidates = source.stations_in_bbox(&bbox, cancel).await?;
    let candidate_count = candidates.len();
    let ranked = rank_stations(center, radius_miles, candidates);
    debug!(
        "{} of {} stations in {} lie within {} mi",
        ranked.len(),
        candidate_count,
        bbox,
        radius_miles
    );
    Ok(ranked)
}

/// Finds the nearest observing station within `radius_miles` of `center`.
///
/// `Ok(None)` means the lookup succeeded but no station lies within the radius.
/// A failed or cancelled lookup never yields a station.
pub async fn find_nearest_observing_station(
    source: &dyn StationSource,
    center: LatLon,
    radius_miles: f64,
    cancel: &CancellationToken,
) -> Result<Option<Station>, LocateStationError> {
    let ranked = stations_within(source, center, radius_miles, cancel).await?;
    let selected = select_station(&ranked).cloned();
    log_selection(center, radius_miles, selected.as_ref());
    Ok(selected)
}

pub(crate) fn log_selection(center: LatLon, radius_miles: f64, selected: Option<&Station>) {
    match selected {
        Some(station) => info!("Nearest station to {}: {}", center, station.describe()),
        None => info!("No station within {} mi of {}", radius_miles, center),
    }
}
