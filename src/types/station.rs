//! Aviation weather stations as returned by the station-metadata service, and the
//! ranked form produced by the station locator.

use crate::types::geo::LatLon;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A weather station from the station-metadata service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StationInfo {
    /// ICAO-style station identifier (e.g. "KSFO").
    pub id: String,
    /// Human-readable site name, empty when the service has none.
    pub site: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Capability tags advertised by the station (e.g. "METAR", "TAF").
    pub site_types: Vec<String>,
}

impl StationInfo {
    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    /// Whether the station advertises routine observation reports.
    pub fn has_metar(&self) -> bool {
        self.site_types
            .iter()
            .any(|t| t.to_ascii_lowercase().contains("metar"))
    }
}

/// A station together with its distance from a queried centre.
///
/// The distance is not intrinsic to the station; a `Station` only lives as long as
/// the selection it was computed for.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    #[serde(flatten)]
    pub info: StationInfo,
    pub distance_miles: f64,
}

impl Station {
    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn longitude(&self) -> f64 {
        self.info.longitude
    }

    /// `KSFO — San Francisco Intl (3.2 mi)` style summary line.
    pub fn describe(&self) -> String {
        if self.info.site.is_empty() {
            format!("{} ({:.1} mi)", self.info.id, self.distance_miles)
        } else {
            format!(
                "{} — {} ({:.1} mi)",
                self.info.id, self.info.site, self.distance_miles
            )
        }
    }
}

// --- Station-metadata GeoJSON ---

#[derive(Debug, Deserialize, Default)]
pub(crate) struct StationFeatureCollection {
    /// Features that fail to decode are dropped one by one.
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StationFeature {
    #[serde(default)]
    pub properties: Option<StationProperties>,
    pub geometry: Option<PointGeometry>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StationProperties {
    pub icao_id: Option<String>,
    pub site: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub site_type: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointGeometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<serde_json::Value>,
}

fn lenient_features<'de, D>(deserializer: D) -> Result<Vec<StationFeature>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    let total = items.len();
    let features: Vec<StationFeature> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if features.len() < total {
        debug!("Skipped {} undecodable station features", total - features.len());
    }
    Ok(features)
}

/// Capability tags; anything other than an array reads as no tags.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(tag) => Some(tag),
            _ => None,
        })
        .collect())
}

impl PointGeometry {
    /// `(lat, lon)` of a GeoJSON Point, whose coordinates are stored as `[lon, lat]`.
    pub fn lat_lon(&self) -> Option<LatLon> {
        if self.kind.as_deref().is_some_and(|kind| kind != "Point") {
            return None;
        }
        let lon = self.coordinates.first()?.as_f64()?;
        let lat = self.coordinates.get(1)?.as_f64()?;
        let point = LatLon(lat, lon);
        point.is_finite().then_some(point)
    }
}

impl StationFeatureCollection {
    /// Keeps only features with an identifier and a finite point location.
    pub fn into_stations(self) -> Vec<StationInfo> {
        self.features
            .into_iter()
            .filter_map(|feature| {
                let properties = feature.properties?;
                let id = properties.icao_id.as_deref()?.trim().to_string();
                if id.is_empty() {
                    return None;
                }
                let location = feature.geometry.as_ref()?.lat_lon()?;
                Some(StationInfo {
                    id,
                    site: properties
                        .site
                        .as_deref()
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                    latitude: location.0,
                    longitude: location.1,
                    site_types: properties.site_type,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_station_geojson() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "properties": {"icaoId": "KSFO", "site": "San Francisco Intl", "siteType": ["METAR", "TAF"]},
                 "geometry": {"type": "Point", "coordinates": [-122.375, 37.619]}},
                {"type": "Feature",
                 "properties": {"icaoId": "", "site": "No id"},
                 "geometry": {"type": "Point", "coordinates": [-122.0, 37.0]}},
                {"type": "Feature",
                 "properties": {"icaoId": "KXXX"},
                 "geometry": null},
                {"type": "Feature",
                 "properties": {"icaoId": "KOAK", "siteType": ["rawOb"]},
                 "geometry": {"type": "Point", "coordinates": [-122.22, 37.72]}}
            ]
        }"#;
        let collection: StationFeatureCollection = serde_json::from_str(json).unwrap();
        let stations = collection.into_stations();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].id, "KSFO");
        assert_eq!(stations[0].latitude, 37.619);
        assert!(stations[0].has_metar());
        assert_eq!(stations[1].site, "");
        assert!(!stations[1].has_metar());
    }

    #[test]
    fn test_malformed_features_are_skipped() {
        let json = r#"{
            "features": [
                {"properties": {"icaoId": "KSFO", "siteType": ["METAR"]},
                 "geometry": {"type": "Point", "coordinates": [-122.375, 37.619]}},
                {"properties": {"icaoId": "KNUL", "siteType": null},
                 "geometry": {"type": "Point", "coordinates": [-122.1, 37.1]}},
                {"properties": {"icaoId": "KSTR", "siteType": "METAR"},
                 "geometry": {"coordinates": [-122.2, 37.2]}},
                {"properties": null,
                 "geometry": {"type": "Point", "coordinates": [-122.3, 37.3]}},
                {"properties": {"icaoId": "KBAD"},
                 "geometry": {"type": "Point", "coordinates": "nowhere"}},
                {"properties": {"icaoId": "KLIN"},
                 "geometry": {"type": "LineString", "coordinates": [-122.4, 37.4]}},
                "not a feature"
            ]
        }"#;
        let collection: StationFeatureCollection = serde_json::from_str(json).unwrap();
        let stations = collection.into_stations();
        let ids: Vec<&str> = stations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["KSFO", "KNUL", "KSTR"]);
        assert!(stations[0].has_metar());
        assert!(stations[1].site_types.is_empty());
        assert!(stations[2].site_types.is_empty());
    }

    #[test]
    fn test_describe() {
        let station = Station {
            info: StationInfo {
                id: "KSFO".into(),
                site: "San Francisco Intl".into(),
                latitude: 37.6,
                longitude: -122.4,
                site_types: vec!["METAR".into()],
            },
            distance_miles: 3.24,
        };
        assert_eq!(station.describe(), "KSFO — San Francisco Intl (3.2 mi)");
    }
}
