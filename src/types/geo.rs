//! Coordinates, bounding boxes and great-circle distance.

use crate::units::km_to_miles;
use haversine::{distance, Location as HaversineLocation, Units};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Statute miles per degree of latitude, used for the flat-Earth bounding box.
const MILES_PER_DEGREE: f64 = 69.0;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// ```
/// use cbc_weather::LatLon;
///
/// let point_reyes = LatLon(38.07, -122.88);
/// assert_eq!(point_reyes.0, 38.07);
/// assert_eq!(point_reyes.1, -122.88);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(self) -> f64 {
        self.0
    }

    pub fn longitude(self) -> f64 {
        self.1
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }

    /// Great-circle distance in statute miles (haversine, mean Earth radius 6371 km).
    pub fn distance_miles(self, other: LatLon) -> Option<f64> {
        if !self.is_finite() || !other.is_finite() {
            return None;
        }
        let km = distance(
            HaversineLocation {
                latitude: self.0,
                longitude: self.1,
            },
            HaversineLocation {
                latitude: other.0,
                longitude: other.1,
            },
            Units::Kilometers,
        );
        km_to_miles(km)
    }
}

impl Display for LatLon {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.0, self.1)
    }
}

/// An axis-aligned latitude/longitude box, south-west to north-east corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Builds a box around `center` reaching `radius_miles` in every direction,
    /// using 69 miles per degree of latitude and shrinking longitude degrees by
    /// `cos(latitude)`.
    ///
    /// The box is a superset of the circle of that radius; callers still filter
    /// by exact great-circle distance. Returns `None` for non-finite input.
    pub fn around(center: LatLon, radius_miles: f64) -> Option<Self> {
        if !center.is_finite() || !radius_miles.is_finite() {
            return None;
        }
        let lat_delta = radius_miles / MILES_PER_DEGREE;
        let lon_delta = radius_miles / (MILES_PER_DEGREE * center.0.to_radians().cos());
        Some(Self {
            min_lat: center.0 - lat_delta,
            min_lon: center.1 - lon_delta,
            max_lat: center.0 + lat_delta,
            max_lon: center.1 + lon_delta,
        })
    }

    pub fn contains(&self, point: LatLon) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.0)
            && (self.min_lon..=self.max_lon).contains(&point.1)
    }
}

/// Renders the box as the comma-joined `minLat,minLon,maxLat,maxLon` query form.
impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_around_equator() {
        let bbox = BoundingBox::around(LatLon(0.0, 0.0), 69.0).unwrap();
        assert!((bbox.max_lat - 1.0).abs() < 1e-12);
        assert!((bbox.min_lon + 1.0).abs() < 1e-12);
        assert_eq!(bbox.to_string(), "-1,-1,1,1");
    }

    #[test]
    fn test_bbox_widens_with_latitude() {
        let bbox = BoundingBox::around(LatLon(60.0, 10.0), 15.0).unwrap();
        let lat_span = bbox.max_lat - bbox.min_lat;
        let lon_span = bbox.max_lon - bbox.min_lon;
        assert!((lon_span / lat_span - 2.0).abs() < 1e-9);
        assert!(bbox.contains(LatLon(60.0, 10.0)));
        assert!(!bbox.contains(LatLon(61.0, 10.0)));
    }

    #[test]
    fn test_bbox_rejects_nan() {
        assert!(BoundingBox::around(LatLon(f64::NAN, 0.0), 10.0).is_none());
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let miles = LatLon(40.0, -75.0)
            .distance_miles(LatLon(41.0, -75.0))
            .unwrap();
        // 6371 km * pi/180 * 0.621371
        assert!((miles - 69.09).abs() < 0.01, "got {miles}");
    }
}
