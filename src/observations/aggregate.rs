//! Folding a batch of station observations into a count-day report patch.
//!
//! Everything here is total: missing or malformed values are skipped, never
//! turned into errors or zeroes.

use crate::observations::local_day::classify_local_day;
use crate::types::categories::{CloudCover, HalfDay, Intensity, WindDirection};
use crate::types::observation::{Observation, WindReading};
use crate::types::report::{
    CountDayReconstruction, DerivedReportPatch, HalfDaySummary, ValueRange,
};
use crate::units::{approx_utc_offset_hours, celsius_to_fahrenheit, knots_to_mph};
use chrono::NaiveDate;
use log::debug;

/// Present-weather code for fog patches.
const LOCAL_FOG_CODE: &str = "BCFG";
/// Present-weather code for fog.
const FOG_CODE: &str = "FG";

/// Phenomenon codes of the rain family. Shower, thunderstorm and freezing
/// variants (`SHRA`, `TSRA`, `FZRA`) contain `RA`.
const RAIN_CODES: [&str; 2] = ["RA", "DZ"];
/// Phenomenon codes of the snow family. `SHSN` contains `SN`.
const SNOW_CODES: [&str; 2] = ["SN", "SG"];

/// A precipitation family tracked on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precipitation {
    Rain,
    Snow,
}

impl Precipitation {
    fn codes(self) -> &'static [&'static str] {
        match self {
            Precipitation::Rain => &RAIN_CODES,
            Precipitation::Snow => &SNOW_CODES,
        }
    }
}

/// Severity of a METAR cloud coverage code; `0` for unrecognised codes.
fn cover_severity(code: &str) -> u8 {
    match code {
        "OVC" | "OVX" => 5,
        "BKN" => 4,
        "SCT" => 3,
        "FEW" => 2,
        "CLR" | "CAVOK" => 1,
        _ => 0,
    }
}

/// Derives the cloud category of a single observation.
///
/// Fog in the present-weather text wins over any cloud layer. Otherwise the most
/// severe coverage code decides. An observation with no layers at all reads as
/// clear; one whose layers carry only unrecognised codes is `Unknown`.
pub fn cloud_category(observation: &Observation) -> CloudCover {
    let wx = observation
        .wx_string
        .as_deref()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if wx.contains(LOCAL_FOG_CODE) {
        return CloudCover::LocalFog;
    }
    if wx.contains(FOG_CODE) {
        return CloudCover::Foggy;
    }

    let covers: Vec<String> = observation
        .clouds
        .iter()
        .filter_map(|layer| layer.cover.as_deref())
        .map(|cover| cover.trim().to_ascii_uppercase())
        .filter(|cover| !cover.is_empty())
        .collect();
    let Some(worst) = covers.iter().max_by_key(|cover| cover_severity(cover)) else {
        return CloudCover::Clear;
    };

    match worst.as_str() {
        "CLR" | "CAVOK" => CloudCover::Clear,
        "FEW" => CloudCover::PartlyClear,
        "SCT" => CloudCover::PartlyCloudy,
        "BKN" | "OVC" | "OVX" => CloudCover::Cloudy,
        _ => CloudCover::Unknown,
    }
}

/// Derives the intensity of one precipitation family from present-weather text.
///
/// Each whitespace-separated group is examined on its own: a group mentioning a
/// code of the family is heavy with a `+` prefix and light otherwise. The
/// strongest group wins; without any matching group the intensity is `None`.
///
/// ```
/// use cbc_weather::{precipitation_intensity, Intensity, Precipitation};
///
/// assert_eq!(precipitation_intensity("-RA BR", Precipitation::Rain), Intensity::Light);
/// assert_eq!(precipitation_intensity("-RA +SN", Precipitation::Snow), Intensity::Heavy);
/// assert_eq!(precipitation_intensity("FG", Precipitation::Rain), Intensity::None);
/// ```
pub fn precipitation_intensity(wx_string: &str, family: Precipitation) -> Intensity {
    wx_string
        .split_whitespace()
        .map(|group| group.to_ascii_uppercase())
        .filter_map(|group| {
            let (heavy, phenomena) = match group.strip_prefix('+') {
                Some(rest) => (true, rest),
                None => (false, group.strip_prefix('-').unwrap_or(&group)),
            };
            family
                .codes()
                .iter()
                .any(|code| phenomena.contains(code))
                .then_some(if heavy { Intensity::Heavy } else { Intensity::Light })
        })
        .fold(Intensity::None, Intensity::max)
}

/// Circular mean of compass directions, normalised to `[0, 360)`.
///
/// Returns `None` when there is no finite direction to average.
///
/// ```
/// use cbc_weather::circular_mean_degrees;
///
/// let mean = circular_mean_degrees(&[350.0, 10.0]).unwrap();
/// assert!(mean < 1e-9 || (360.0 - mean) < 1e-9);
/// ```
pub fn circular_mean_degrees(directions: &[f64]) -> Option<f64> {
    let radians: Vec<f64> = directions
        .iter()
        .filter(|d| d.is_finite())
        .map(|d| d.to_radians())
        .collect();
    if radians.is_empty() {
        return None;
    }
    let n = radians.len() as f64;
    let mean_sin = radians.iter().map(|r| r.sin()).sum::<f64>() / n;
    let mean_cos = radians.iter().map(|r| r.cos()).sum::<f64>() / n;
    let mean = mean_sin.atan2(mean_cos).to_degrees();
    Some((mean + 360.0) % 360.0)
}

/// Running state while folding the observations of one count day.
#[derive(Debug, Default)]
struct CountDayAccumulator {
    temperatures_f: Vec<f64>,
    wind_speeds_mph: Vec<f64>,
    snow_depths_in: Vec<f64>,
    directions: Vec<f64>,
    variable_wind: bool,
    am: HalfDaySummary,
    pm: HalfDaySummary,
    used_count: usize,
}

impl CountDayAccumulator {
    fn push(&mut self, observation: &Observation, half: HalfDay) {
        self.used_count += 1;

        if let Some(f) = observation.temp_c.and_then(celsius_to_fahrenheit) {
            self.temperatures_f.push(f);
        }
        if let Some(mph) = observation.wind_speed_kt.and_then(knots_to_mph) {
            self.wind_speeds_mph.push(mph);
        }
        if let Some(snow) = observation.snow_depth_in.filter(|s| s.is_finite()) {
            self.snow_depths_in.push(snow);
        }
        match observation.wind_direction {
            Some(WindReading::Variable) => self.variable_wind = true,
            Some(WindReading::Degrees(degrees)) if degrees.is_finite() => {
                self.directions.push(degrees)
            }
            _ => {}
        }

        let wx = observation.wx_string.as_deref().unwrap_or_default();
        let bucket = match half {
            HalfDay::Am => &mut self.am,
            HalfDay::Pm => &mut self.pm,
        };
        bucket.cloud_cover = bucket.cloud_cover.worst(cloud_category(observation));
        bucket.rain = bucket
            .rain
            .max(precipitation_intensity(wx, Precipitation::Rain));
        bucket.snow = bucket
            .snow
            .max(precipitation_intensity(wx, Precipitation::Snow));
    }

    fn wind_direction(&self) -> Option<WindDirection> {
        if self.variable_wind {
            return Some(WindDirection::Variable);
        }
        circular_mean_degrees(&self.directions).and_then(WindDirection::mean)
    }

    fn finish(self) -> CountDayReconstruction {
        if self.used_count == 0 {
            return CountDayReconstruction::empty();
        }
        let patch = DerivedReportPatch {
            temperature_f: ValueRange::of(&self.temperatures_f),
            wind_mph: ValueRange::of(&self.wind_speeds_mph),
            snow_depth_in: ValueRange::of(&self.snow_depths_in),
            wind_direction: self.wind_direction(),
            am: self.am,
            pm: self.pm,
            used_count: self.used_count,
        };
        CountDayReconstruction {
            patch: Some(patch),
            used_count: self.used_count,
        }
    }
}

/// Reconstructs the count-day report values from a batch of observations.
///
/// The local day is approximated from `station_longitude` (15° per hour).
/// Observations without a timestamp or outside the local day are ignored and
/// do not count as used. When none are used the result carries no patch.
///
/// ```
/// use cbc_weather::{aggregate_count_day_observations, CloudLayer, Observation};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
/// let reports = vec![Observation::builder()
///     .obs_time(1_734_789_600)
///     .temp_c(2.0)
///     .clouds(vec![CloudLayer::with_cover("BKN")])
///     .build()];
/// let result = aggregate_count_day_observations(&reports, date, -122.0);
/// let patch = result.patch.unwrap();
/// assert_eq!(patch.temperature_f.unwrap().min_label(), "35.6");
/// assert_eq!(result.used_count, 1);
/// ```
pub fn aggregate_count_day_observations(
    observations: &[Observation],
    date: NaiveDate,
    station_longitude: f64,
) -> CountDayReconstruction {
    let utc_offset_hours = approx_utc_offset_hours(station_longitude);
    let mut accumulator = CountDayAccumulator::default();
    for observation in observations {
        let Some(obs_time) = observation.obs_time else {
            continue;
        };
        if let Some(slot) = classify_local_day(obs_time, date, utc_offset_hours) {
            accumulator.push(observation, slot.half);
        }
    }
    debug!(
        "Aggregated {} of {} observations for {} (UTC{:+})",
        accumulator.used_count,
        observations.len(),
        date,
        utc_offset_hours
    );
    accumulator.finish()
}
