mod cbc_weather;
mod circles;
mod clients;
mod config;
mod error;
mod observations;
mod orchestrator;
mod prefill;
mod reports;
mod stations;
mod types;
mod units;
mod utils;

pub use cbc_weather::CbcWeather;
pub use config::{PipelineConfig, BASE_URL_ENV_VAR, DEFAULT_BASE_URL};
pub use error::CbcWeatherError;
pub use orchestrator::{CountDayOrchestrator, PipelinePhase, PipelineSnapshot, StageState};

pub use clients::aviation_weather::AviationWeatherClient;
pub use clients::source::{AviationWeatherSource, ObservationSource, StationSource};

pub use types::categories::*;
pub use types::circle::{Circle, DEFAULT_BUFFER_MILES};
pub use types::geo::{BoundingBox, LatLon};
pub use types::observation::{CloudLayer, Observation, WindReading};
pub use types::report::*;
pub use types::station::{Station, StationInfo};

pub use units::{
    approx_utc_offset_hours, celsius_to_fahrenheit, format_tenths, km_to_miles, knots_to_mph,
    MILES_PER_KM, MPH_PER_KNOT,
};

pub use observations::aggregate::{
    aggregate_count_day_observations, circular_mean_degrees, cloud_category,
    precipitation_intensity, Precipitation,
};
pub use observations::fetch::fetch_count_day;
pub use observations::local_day::{classify_local_day, LocalDaySlot};
pub use observations::window::ObservationWindow;

pub use stations::locate_station::{
    find_nearest_observing_station, rank_stations, select_station, stations_within,
};

pub use prefill::canonical::{canonical_cloud_cover, canonical_cloud_label};
pub use prefill::merge::{canonicalize_cloud_fields, merge_prefill};

pub use circles::index::CircleIndex;
pub use circles::record::{circle_from_properties, normalize_count_date};

pub use reports::store::{ReportStore, SavedReport, REPORT_STORE_FILE_NAME};

pub use circles::error::CircleIndexError;
pub use clients::error::AviationWeatherError;
pub use observations::error::ObservationFetchError;
pub use reports::error::ReportStoreError;
pub use stations::error::LocateStationError;
