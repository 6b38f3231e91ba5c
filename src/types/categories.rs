//! Categorical values used by the count-day report: cloud cover, precipitation
//! intensity, water state, wind direction and the AM/PM half of the day.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// The half of the local day an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HalfDay {
    /// 00:00 to 11:59 local time.
    Am,
    /// 12:00 to 23:59 local time.
    Pm,
}

impl HalfDay {
    /// The half of the day a local hour (`0..24`) falls in.
    pub fn from_local_hour(hour: u32) -> Self {
        if hour < 12 {
            HalfDay::Am
        } else {
            HalfDay::Pm
        }
    }
}

/// Cloud cover category recorded per half day on the count-day report.
///
/// Fog dominates any cloud layer report: an observation with fog is categorised as
/// fog regardless of coverage, and fog wins when observations are folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CloudCover {
    #[serde(rename = "Clear")]
    Clear,
    #[serde(rename = "Partly Clear")]
    PartlyClear,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    #[serde(rename = "Cloudy")]
    Cloudy,
    #[serde(rename = "Foggy")]
    Foggy,
    #[serde(rename = "Local Fog")]
    LocalFog,
    #[default]
    #[serde(rename = "Unknown")]
    Unknown,
}

impl CloudCover {
    /// All categories in the order a report form offers them.
    pub const ALL: [CloudCover; 7] = [
        CloudCover::Clear,
        CloudCover::Cloudy,
        CloudCover::Foggy,
        CloudCover::LocalFog,
        CloudCover::PartlyClear,
        CloudCover::PartlyCloudy,
        CloudCover::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CloudCover::Clear => "Clear",
            CloudCover::PartlyClear => "Partly Clear",
            CloudCover::PartlyCloudy => "Partly Cloudy",
            CloudCover::Cloudy => "Cloudy",
            CloudCover::Foggy => "Foggy",
            CloudCover::LocalFog => "Local Fog",
            CloudCover::Unknown => "Unknown",
        }
    }

    /// Severity used when folding several observations into one half day.
    /// `Unknown` ranks lowest so any real observation replaces it.
    pub fn severity(self) -> u8 {
        match self {
            CloudCover::Unknown => 0,
            CloudCover::Clear => 1,
            CloudCover::PartlyClear => 2,
            CloudCover::PartlyCloudy => 3,
            CloudCover::Cloudy => 4,
            CloudCover::Foggy => 5,
            CloudCover::LocalFog => 6,
        }
    }

    /// The more severe of two categories; ties keep `self`.
    pub fn worst(self, other: CloudCover) -> CloudCover {
        if self.severity() >= other.severity() {
            self
        } else {
            other
        }
    }
}

impl Display for CloudCover {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rain or snow intensity for a half day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Intensity {
    #[default]
    None,
    Light,
    Heavy,
    Unknown,
}

impl Intensity {
    pub const ALL: [Intensity; 4] = [
        Intensity::None,
        Intensity::Light,
        Intensity::Heavy,
        Intensity::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Intensity::None => "None",
            Intensity::Light => "Light",
            Intensity::Heavy => "Heavy",
            Intensity::Unknown => "Unknown",
        }
    }

    /// `Unknown` ranks like `None` and therefore never raises a maximum.
    pub fn rank(self) -> u8 {
        match self {
            Intensity::None | Intensity::Unknown => 0,
            Intensity::Light => 1,
            Intensity::Heavy => 2,
        }
    }

    /// The stronger of two intensities; on equal rank `self` is kept.
    pub fn max(self, other: Intensity) -> Intensity {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl Display for Intensity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Still or moving open water observed on the count day. Only ever entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WaterState {
    None,
    Some,
    Many,
    #[default]
    Unknown,
}

impl WaterState {
    pub const ALL: [WaterState; 4] = [
        WaterState::None,
        WaterState::Some,
        WaterState::Many,
        WaterState::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WaterState::None => "None",
            WaterState::Some => "Some",
            WaterState::Many => "Many",
            WaterState::Unknown => "Unknown",
        }
    }
}

/// One of the 16 points of the compass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl CompassPoint {
    pub const ALL: [CompassPoint; 16] = [
        CompassPoint::N,
        CompassPoint::NNE,
        CompassPoint::NE,
        CompassPoint::ENE,
        CompassPoint::E,
        CompassPoint::ESE,
        CompassPoint::SE,
        CompassPoint::SSE,
        CompassPoint::S,
        CompassPoint::SSW,
        CompassPoint::SW,
        CompassPoint::WSW,
        CompassPoint::W,
        CompassPoint::WNW,
        CompassPoint::NW,
        CompassPoint::NNW,
    ];

    /// Maps an angle in degrees to the nearest compass point.
    ///
    /// Each point spans 22.5°, with boundaries at odd multiples of 11.25°; an angle
    /// sitting exactly on a boundary goes to the clockwise neighbour. Returns `None`
    /// for non-finite input.
    ///
    /// ```
    /// use cbc_weather::CompassPoint;
    ///
    /// assert_eq!(CompassPoint::from_degrees(0.0), Some(CompassPoint::N));
    /// assert_eq!(CompassPoint::from_degrees(355.0), Some(CompassPoint::N));
    /// assert_eq!(CompassPoint::from_degrees(270.0), Some(CompassPoint::W));
    /// ```
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let sector = (degrees.rem_euclid(360.0) / 22.5 + 0.5).floor() as usize;
        Some(Self::ALL[sector % 16])
    }

    pub fn label(self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NNE => "NNE",
            CompassPoint::NE => "NE",
            CompassPoint::ENE => "ENE",
            CompassPoint::E => "E",
            CompassPoint::ESE => "ESE",
            CompassPoint::SE => "SE",
            CompassPoint::SSE => "SSE",
            CompassPoint::S => "S",
            CompassPoint::SSW => "SSW",
            CompassPoint::SW => "SW",
            CompassPoint::WSW => "WSW",
            CompassPoint::W => "W",
            CompassPoint::WNW => "WNW",
            CompassPoint::NW => "NW",
            CompassPoint::NNW => "NNW",
        }
    }
}

impl Display for CompassPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Prevailing wind direction over the count day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WindDirection {
    /// At least one report gave a variable direction.
    Variable,
    /// Circular mean of the reported directions.
    Mean { degrees: f64, point: CompassPoint },
}

impl WindDirection {
    /// Form labels for wind direction: the 16 compass points plus the special values.
    pub const FORM_LABELS: [&'static str; 19] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW", "Variable", "Calm", "Unknown",
    ];

    /// Builds a mean direction, or `None` when the angle is not finite.
    pub fn mean(degrees: f64) -> Option<Self> {
        CompassPoint::from_degrees(degrees).map(|point| WindDirection::Mean {
            degrees: degrees.rem_euclid(360.0),
            point,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            WindDirection::Variable => "Variable",
            WindDirection::Mean { point, .. } => point.label(),
        }
    }
}

impl Display for WindDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compass_boundaries() {
        assert_eq!(CompassPoint::from_degrees(11.24), Some(CompassPoint::N));
        assert_eq!(CompassPoint::from_degrees(11.25), Some(CompassPoint::NNE));
        assert_eq!(CompassPoint::from_degrees(348.75), Some(CompassPoint::N));
        assert_eq!(CompassPoint::from_degrees(348.74), Some(CompassPoint::NNW));
        assert_eq!(CompassPoint::from_degrees(360.0), Some(CompassPoint::N));
        assert_eq!(CompassPoint::from_degrees(-90.0), Some(CompassPoint::W));
        assert_eq!(CompassPoint::from_degrees(180.0), Some(CompassPoint::S));
        assert_eq!(CompassPoint::from_degrees(f64::NAN), None);
    }

    #[test]
    fn test_cloud_precedence_fog_dominates() {
        assert_eq!(CloudCover::Cloudy.worst(CloudCover::Foggy), CloudCover::Foggy);
        assert_eq!(CloudCover::Foggy.worst(CloudCover::LocalFog), CloudCover::LocalFog);
        assert_eq!(CloudCover::Unknown.worst(CloudCover::Clear), CloudCover::Clear);
        assert_eq!(CloudCover::PartlyCloudy.worst(CloudCover::PartlyClear), CloudCover::PartlyCloudy);
    }

    #[test]
    fn test_intensity_unknown_never_raises() {
        assert_eq!(Intensity::None.max(Intensity::Unknown), Intensity::None);
        assert_eq!(Intensity::Light.max(Intensity::Unknown), Intensity::Light);
        assert_eq!(Intensity::Light.max(Intensity::Heavy), Intensity::Heavy);
        assert_eq!(Intensity::Heavy.max(Intensity::Light), Intensity::Heavy);
    }

    #[test]
    fn test_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&CloudCover::PartlyClear).unwrap();
        assert_eq!(json, "\"Partly Clear\"");
        assert_eq!(WindDirection::Variable.label(), "Variable");
        assert_eq!(WindDirection::mean(275.0).unwrap().label(), "W");
    }
}
