//! The derived count-day patch and the user-owned report form it is merged into.

use crate::types::categories::{CloudCover, HalfDay, Intensity, WaterState, WindDirection};
use crate::units::{format_tenths, round_tenths};
use serde::{Deserialize, Serialize};

/// Longest stored length of each part of a [`ReportKey`].
const KEY_PART_MAX_CHARS: usize = 200;

/// Label marking a categorical field as not yet known.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Minimum and maximum of a quantity over the count day, rounded to tenths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range of a list of values, or `None` for an empty list.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let first = finite.next()?;
        let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self {
            min: round_tenths(min),
            max: round_tenths(max),
        })
    }

    pub fn min_label(&self) -> String {
        format_tenths(self.min)
    }

    pub fn max_label(&self) -> String {
        format_tenths(self.max)
    }
}

/// Cloud and precipitation summary for one half of the count day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfDaySummary {
    pub cloud_cover: CloudCover,
    pub rain: Intensity,
    pub snow: Intensity,
}

impl Default for HalfDaySummary {
    fn default() -> Self {
        Self {
            cloud_cover: CloudCover::Unknown,
            rain: Intensity::None,
            snow: Intensity::None,
        }
    }
}

/// Values reconstructed from station observations, ready to prefill a report.
///
/// Numeric ranges are absent when no observation carried that quantity; they are
/// never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedReportPatch {
    pub temperature_f: Option<ValueRange>,
    pub wind_mph: Option<ValueRange>,
    pub snow_depth_in: Option<ValueRange>,
    pub wind_direction: Option<WindDirection>,
    pub am: HalfDaySummary,
    pub pm: HalfDaySummary,
    /// Number of observations that fell inside the local count day.
    pub used_count: usize,
}

impl DerivedReportPatch {
    pub fn half(&self, half: HalfDay) -> &HalfDaySummary {
        match half {
            HalfDay::Am => &self.am,
            HalfDay::Pm => &self.pm,
        }
    }

    /// The patch as `(form field, value)` pairs, in form order.
    pub fn form_values(&self) -> Vec<(ReportField, String)> {
        let mut values = Vec::with_capacity(13);
        if let Some(range) = &self.temperature_f {
            values.push((ReportField::TempMinF, range.min_label()));
            values.push((ReportField::TempMaxF, range.max_label()));
        }
        if let Some(direction) = &self.wind_direction {
            values.push((ReportField::WindDir, direction.label().to_string()));
        }
        if let Some(range) = &self.wind_mph {
            values.push((ReportField::WindMinMph, range.min_label()));
            values.push((ReportField::WindMaxMph, range.max_label()));
        }
        if let Some(range) = &self.snow_depth_in {
            values.push((ReportField::SnowMinIn, range.min_label()));
            values.push((ReportField::SnowMaxIn, range.max_label()));
        }
        values.push((ReportField::CloudCoverAm, self.am.cloud_cover.label().to_string()));
        values.push((ReportField::CloudCoverPm, self.pm.cloud_cover.label().to_string()));
        values.push((ReportField::AmRain, self.am.rain.label().to_string()));
        values.push((ReportField::AmSnow, self.am.snow.label().to_string()));
        values.push((ReportField::PmRain, self.pm.rain.label().to_string()));
        values.push((ReportField::PmSnow, self.pm.snow.label().to_string()));
        values
    }
}

/// Result of reconstructing one count day from a batch of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountDayReconstruction {
    /// `None` when no observation fell inside the local count day.
    pub patch: Option<DerivedReportPatch>,
    pub used_count: usize,
}

impl CountDayReconstruction {
    pub fn empty() -> Self {
        Self {
            patch: None,
            used_count: 0,
        }
    }
}

/// Named fields of a [`ReportForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    Weather,
    TempMinF,
    TempMaxF,
    WindDir,
    WindMinMph,
    WindMaxMph,
    SnowMinIn,
    SnowMaxIn,
    StillWater,
    MovingWater,
    CloudCoverAm,
    CloudCoverPm,
    AmRain,
    AmSnow,
    PmRain,
    PmSnow,
}

impl ReportField {
    pub const ALL: [ReportField; 16] = [
        ReportField::Weather,
        ReportField::TempMinF,
        ReportField::TempMaxF,
        ReportField::WindDir,
        ReportField::WindMinMph,
        ReportField::WindMaxMph,
        ReportField::SnowMinIn,
        ReportField::SnowMaxIn,
        ReportField::StillWater,
        ReportField::MovingWater,
        ReportField::CloudCoverAm,
        ReportField::CloudCoverPm,
        ReportField::AmRain,
        ReportField::AmSnow,
        ReportField::PmRain,
        ReportField::PmSnow,
    ];

    /// Labels a categorical field accepts; `None` for free-text and numeric fields.
    pub fn choices(self) -> Option<Vec<&'static str>> {
        match self {
            ReportField::WindDir => Some(WindDirection::FORM_LABELS.to_vec()),
            ReportField::CloudCoverAm | ReportField::CloudCoverPm => {
                Some(CloudCover::ALL.iter().map(|c| c.label()).collect())
            }
            ReportField::AmRain | ReportField::AmSnow | ReportField::PmRain | ReportField::PmSnow => {
                Some(Intensity::ALL.iter().map(|i| i.label()).collect())
            }
            ReportField::StillWater | ReportField::MovingWater => {
                Some(WaterState::ALL.iter().map(|w| w.label()).collect())
            }
            _ => None,
        }
    }

    /// Storage and export name of the field.
    pub fn name(self) -> &'static str {
        match self {
            ReportField::Weather => "weather",
            ReportField::TempMinF => "tempMinF",
            ReportField::TempMaxF => "tempMaxF",
            ReportField::WindDir => "windDir",
            ReportField::WindMinMph => "windMinMph",
            ReportField::WindMaxMph => "windMaxMph",
            ReportField::SnowMinIn => "snowMinIn",
            ReportField::SnowMaxIn => "snowMaxIn",
            ReportField::StillWater => "stillWater",
            ReportField::MovingWater => "movingWater",
            ReportField::CloudCoverAm => "cloudCoverAM",
            ReportField::CloudCoverPm => "cloudCoverPM",
            ReportField::AmRain => "amRain",
            ReportField::AmSnow => "amSnow",
            ReportField::PmRain => "pmRain",
            ReportField::PmSnow => "pmSnow",
        }
    }
}

/// The user-editable count-day weather report.
///
/// Every field is kept as the text the user sees; an empty string or the
/// `"Unknown"` label means the field may still be prefilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportForm {
    pub weather: String,
    pub temp_min_f: String,
    pub temp_max_f: String,
    pub wind_dir: String,
    pub wind_min_mph: String,
    pub wind_max_mph: String,
    pub snow_min_in: String,
    pub snow_max_in: String,
    pub still_water: String,
    pub moving_water: String,
    #[serde(rename = "cloudCoverAM")]
    pub cloud_cover_am: String,
    #[serde(rename = "cloudCoverPM")]
    pub cloud_cover_pm: String,
    pub am_rain: String,
    pub am_snow: String,
    pub pm_rain: String,
    pub pm_snow: String,
}

impl Default for ReportForm {
    fn default() -> Self {
        let unknown = || UNKNOWN_LABEL.to_string();
        Self {
            weather: String::new(),
            temp_min_f: String::new(),
            temp_max_f: String::new(),
            wind_dir: unknown(),
            wind_min_mph: String::new(),
            wind_max_mph: String::new(),
            snow_min_in: String::new(),
            snow_max_in: String::new(),
            still_water: unknown(),
            moving_water: unknown(),
            cloud_cover_am: unknown(),
            cloud_cover_pm: unknown(),
            am_rain: unknown(),
            am_snow: unknown(),
            pm_rain: unknown(),
            pm_snow: unknown(),
        }
    }
}

impl ReportForm {
    pub fn get(&self, field: ReportField) -> &str {
        match field {
            ReportField::Weather => &self.weather,
            ReportField::TempMinF => &self.temp_min_f,
            ReportField::TempMaxF => &self.temp_max_f,
            ReportField::WindDir => &self.wind_dir,
            ReportField::WindMinMph => &self.wind_min_mph,
            ReportField::WindMaxMph => &self.wind_max_mph,
            ReportField::SnowMinIn => &self.snow_min_in,
            ReportField::SnowMaxIn => &self.snow_max_in,
            ReportField::StillWater => &self.still_water,
            ReportField::MovingWater => &self.moving_water,
            ReportField::CloudCoverAm => &self.cloud_cover_am,
            ReportField::CloudCoverPm => &self.cloud_cover_pm,
            ReportField::AmRain => &self.am_rain,
            ReportField::AmSnow => &self.am_snow,
            ReportField::PmRain => &self.pm_rain,
            ReportField::PmSnow => &self.pm_snow,
        }
    }

    pub fn get_mut(&mut self, field: ReportField) -> &mut String {
        match field {
            ReportField::Weather => &mut self.weather,
            ReportField::TempMinF => &mut self.temp_min_f,
            ReportField::TempMaxF => &mut self.temp_max_f,
            ReportField::WindDir => &mut self.wind_dir,
            ReportField::WindMinMph => &mut self.wind_min_mph,
            ReportField::WindMaxMph => &mut self.wind_max_mph,
            ReportField::SnowMinIn => &mut self.snow_min_in,
            ReportField::SnowMaxIn => &mut self.snow_max_in,
            ReportField::StillWater => &mut self.still_water,
            ReportField::MovingWater => &mut self.moving_water,
            ReportField::CloudCoverAm => &mut self.cloud_cover_am,
            ReportField::CloudCoverPm => &mut self.cloud_cover_pm,
            ReportField::AmRain => &mut self.am_rain,
            ReportField::AmSnow => &mut self.am_snow,
            ReportField::PmRain => &mut self.pm_rain,
            ReportField::PmSnow => &mut self.pm_snow,
        }
    }

    pub fn set(&mut self, field: ReportField, value: impl Into<String>) {
        *self.get_mut(field) = value.into();
    }

    /// Categorical fields holding a non-empty label outside their vocabulary.
    pub fn unrecognized_choices(&self) -> Vec<ReportField> {
        ReportField::ALL
            .into_iter()
            .filter(|&field| {
                let value = self.get(field);
                !value.is_empty()
                    && field
                        .choices()
                        .is_some_and(|choices| !choices.iter().any(|c| *c == value))
            })
            .collect()
    }

    /// Whether a field is still open for prefill: exactly `""` or `"Unknown"`.
    /// Anything else, whitespace included, belongs to the user.
    pub fn is_fillable(&self, field: ReportField) -> bool {
        let value = self.get(field);
        value.is_empty() || value == UNKNOWN_LABEL
    }
}

/// Storage key of a report: one per circle name, abbreviation and count date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportKey(String);

impl ReportKey {
    /// ```
    /// use cbc_weather::ReportKey;
    ///
    /// let key = ReportKey::new("  Point  Reyes ", "CAPR", "2024-12-21");
    /// assert_eq!(key.as_str(), "countday|Point Reyes|CAPR|2024-12-21");
    /// ```
    pub fn new(circle_name: &str, abbrev: &str, date_iso: &str) -> Self {
        Self(format!(
            "countday|{}|{}|{}",
            key_part(circle_name),
            key_part(abbrev),
            key_part(date_iso)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn key_part(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(KEY_PART_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_rounds_and_skips_empty() {
        assert_eq!(ValueRange::of(&[]), None);
        let range = ValueRange::of(&[44.6, 35.6, 39.2]).unwrap();
        assert_eq!(range.min_label(), "35.6");
        assert_eq!(range.max_label(), "44.6");
        let range = ValueRange::of(&[9.20624, 13.80936]).unwrap();
        assert_eq!(range.min, 9.2);
        assert_eq!(range.max, 13.8);
    }

    #[test]
    fn test_default_form_is_fully_fillable() {
        let form = ReportForm::default();
        for field in ReportField::ALL {
            assert!(form.is_fillable(field), "{} should be fillable", field.name());
        }
    }

    #[test]
    fn test_form_serde_uses_storage_names() {
        let mut form = ReportForm::default();
        form.set(ReportField::CloudCoverAm, "Cloudy");
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["cloudCoverAM"], "Cloudy");
        assert_eq!(json["tempMinF"], "");

        let partial: ReportForm = serde_json::from_str(r#"{"tempMinF": "20"}"#).unwrap();
        assert_eq!(partial.temp_min_f, "20");
        assert_eq!(partial.pm_snow, "Unknown");
    }

    #[test]
    fn test_field_names_match_serde() {
        let json = serde_json::to_value(ReportForm::default()).unwrap();
        for field in ReportField::ALL {
            assert!(json.get(field.name()).is_some(), "missing {}", field.name());
        }
    }

    #[test]
    fn test_unrecognized_choices() {
        let mut form = ReportForm::default();
        assert!(form.unrecognized_choices().is_empty());

        form.set(ReportField::WindDir, "Calm");
        form.set(ReportField::StillWater, "Many");
        form.set(ReportField::AmRain, "Heavy");
        form.set(ReportField::TempMinF, "whatever");
        assert!(form.unrecognized_choices().is_empty());

        form.set(ReportField::WindDir, "Breezy");
        form.set(ReportField::PmSnow, "Moderate");
        form.set(ReportField::CloudCoverAm, "Overcast");
        assert_eq!(
            form.unrecognized_choices(),
            [ReportField::WindDir, ReportField::CloudCoverAm, ReportField::PmSnow]
        );
        assert_eq!(ReportField::Weather.choices(), None);
    }

    #[test]
    fn test_key_caps_each_part() {
        let long = "x".repeat(250);
        let key = ReportKey::new(&long, "AB", "2024-12-21");
        assert_eq!(key.as_str().len(), "countday|".len() + 200 + "|AB|2024-12-21".len());
    }
}
