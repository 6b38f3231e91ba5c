//! Reading circle records out of dataset features.
//!
//! The circle dataset was merged from several sources, so one logical attribute
//! can appear under different keys. Each attribute has an ordered alias list and
//! the first present, non-empty alias wins.

use crate::types::circle::{Circle, DEFAULT_BUFFER_MILES};
use crate::types::geo::LatLon;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

const NAME_KEYS: [&str; 5] = ["Name", "CircleName", "CIRCLE_NAME", "Abbrev", "ABBREV"];
const ABBREV_KEYS: [&str; 2] = ["Abbrev", "ABBREV"];
const COUNT_DATE_KEYS: [&str; 6] = [
    "Count_Date",
    "COUNT_DATE",
    "CountDate",
    "Count Date",
    "date_label",
    "date",
];
const BUFFER_KEYS: [&str; 3] = ["BUFF_DIST", "BuffDist", "BUFFDIST"];
const LATITUDE_KEYS: [&str; 3] = ["Latitude", "LATITUDE", "Lat"];
const LONGITUDE_KEYS: [&str; 4] = ["Longitude", "LONGITUDE", "Lon", "Lng"];
const ID_KEYS: [&str; 1] = ["Circle_id"];

#[derive(Debug, Deserialize, Default)]
pub(crate) struct CircleFeatureCollection {
    #[serde(default)]
    pub features: Vec<CircleFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CircleFeature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl CircleFeatureCollection {
    /// Circles of all usable features; features without a name or a finite
    /// centre are skipped.
    pub fn into_circles(self) -> Vec<Circle> {
        self.features
            .into_iter()
            .filter_map(|feature| circle_from_properties(&feature.properties?))
            .collect()
    }
}

/// First alias holding a non-empty string or a number, as trimmed text.
fn text_field(properties: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match properties.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First alias holding a finite number, either as a JSON number or numeric text.
fn number_field(properties: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let number = match properties.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        number.is_finite().then_some(number)
    })
}

/// Builds a circle from the properties of one dataset feature.
///
/// Only the circle attributes are kept; anything else in the record (compiler
/// contact details and the like) is dropped here.
pub fn circle_from_properties(properties: &Map<String, Value>) -> Option<Circle> {
    let name = text_field(properties, &NAME_KEYS)?;
    let latitude = number_field(properties, &LATITUDE_KEYS)?;
    let longitude = number_field(properties, &LONGITUDE_KEYS)?;
    let abbrev = text_field(properties, &ABBREV_KEYS).unwrap_or_default();
    let buffer_miles = number_field(properties, &BUFFER_KEYS)
        .filter(|miles| *miles > 0.0)
        .unwrap_or(DEFAULT_BUFFER_MILES);
    let id = text_field(properties, &ID_KEYS)
        .unwrap_or_else(|| format!("{abbrev}:{latitude},{longitude}"));
    let count_date = text_field(properties, &COUNT_DATE_KEYS)
        .as_deref()
        .and_then(normalize_count_date);

    Some(Circle {
        id,
        name,
        abbrev,
        center: LatLon(latitude, longitude),
        buffer_miles,
        count_date,
    })
}

/// Reads a count date written as `YYYY-MM-DD`, `M/D/YY` or `M/D/YYYY`.
///
/// Two-digit years are taken as 20xx. Any other shape, or a date that does not
/// exist on the calendar, gives `None`.
///
/// ```
/// use cbc_weather::normalize_count_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 12, 21);
/// assert_eq!(normalize_count_date("2024-12-21"), expected);
/// assert_eq!(normalize_count_date("12/21/24"), expected);
/// assert_eq!(normalize_count_date("12/21/2024"), expected);
/// assert_eq!(normalize_count_date("Dec 21"), None);
/// ```
pub fn normalize_count_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if is_iso_date_shape(raw) {
        return NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
    }

    let parts: Vec<&str> = raw.split('/').collect();
    let &[month, day, year] = parts.as_slice() else {
        return None;
    };
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(month, 1, 2) || !digits(day, 1, 2) || !digits(year, 2, 4) {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn is_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn properties(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_primary_aliases() {
        let circle = circle_from_properties(&properties(json!({
            "Name": "Point Reyes",
            "Abbrev": "CAPR",
            "Latitude": 38.07,
            "Longitude": -122.88,
            "BUFF_DIST": 7.5,
            "Count_Date": "12/21/2024",
            "Circle_id": 1234,
            "Compiler": "Someone",
            "Email": "someone@example.org"
        })))
        .unwrap();
        assert_eq!(circle.id, "1234");
        assert_eq!(circle.name, "Point Reyes");
        assert_eq!(circle.abbrev, "CAPR");
        assert_eq!(circle.center, LatLon(38.07, -122.88));
        assert_eq!(circle.count_date_iso().as_deref(), Some("2024-12-21"));
    }

    #[test]
    fn test_fallback_aliases() {
        let circle = circle_from_properties(&properties(json!({
            "Name": "  ",
            "CIRCLE_NAME": "Oakland",
            "ABBREV": "CAOA",
            "Lat": "37.8",
            "Lng": "-122.2",
            "BuffDist": "",
            "Count_Date": "",
            "date_label": "2024-12-15"
        })))
        .unwrap();
        assert_eq!(circle.name, "Oakland");
        assert_eq!(circle.abbrev, "CAOA");
        assert_eq!(circle.center, LatLon(37.8, -122.2));
        assert_eq!(circle.buffer_miles, DEFAULT_BUFFER_MILES);
        assert_eq!(circle.id, "CAOA:37.8,-122.2");
        assert_eq!(circle.count_date, NaiveDate::from_ymd_opt(2024, 12, 15));
    }

    #[test]
    fn test_abbrev_stands_in_for_name() {
        let circle = circle_from_properties(&properties(json!({
            "Abbrev": "NYBR",
            "Latitude": 40.6,
            "Longitude": -73.9
        })))
        .unwrap();
        assert_eq!(circle.name, "NYBR");
        assert_eq!(circle.count_date, None);
    }

    #[test]
    fn test_unusable_records() {
        assert!(circle_from_properties(&properties(json!({"Latitude": 1, "Longitude": 2}))).is_none());
        assert!(circle_from_properties(&properties(json!({"Name": "X", "Latitude": "n/a", "Longitude": 2}))).is_none());
    }

    #[test]
    fn test_date_shapes() {
        assert_eq!(normalize_count_date("1/2/25"), NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(normalize_count_date("2/30/2024"), None);
        assert_eq!(normalize_count_date("2024-02-30"), None);
        assert_eq!(normalize_count_date("2024-2-3"), None);
        assert_eq!(normalize_count_date("12/21/202"), NaiveDate::from_ymd_opt(202, 12, 21));
        assert_eq!(normalize_count_date("12/21/24/1"), None);
        assert_eq!(normalize_count_date(""), None);
    }

    #[test]
    fn test_collection_skips_bad_features() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"Name": "A", "Latitude": 1, "Longitude": 2}},
            {"type": "Feature", "properties": null},
            {"type": "Feature", "properties": {"Name": "B"}}
        ]}"#;
        let collection: CircleFeatureCollection = serde_json::from_str(json).unwrap();
        let circles = collection.into_circles();
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].name, "A");
    }
}
