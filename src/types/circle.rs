//! Christmas Bird Count circles.

use crate::types::geo::LatLon;
use crate::types::report::ReportKey;
use chrono::NaiveDate;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// Buffer radius assumed when a circle record carries none.
pub const DEFAULT_BUFFER_MILES: f64 = 7.5;

/// A count circle: a named area of fixed radius around a centre point, counted on
/// one calendar day.
///
/// Circles are immutable once loaded and live in a
/// [`CircleIndex`](crate::CircleIndex) for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub id: String,
    pub name: String,
    pub abbrev: String,
    pub center: LatLon,
    /// Radius of the circle in statute miles.
    pub buffer_miles: f64,
    /// Count date, absent when the record had none or it could not be read.
    pub count_date: Option<NaiveDate>,
}

impl Circle {
    /// The count date as `YYYY-MM-DD`.
    pub fn count_date_iso(&self) -> Option<String> {
        self.count_date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// Storage key of this circle's report, using an empty date part when the
    /// count date is unknown.
    pub fn report_key(&self) -> ReportKey {
        ReportKey::new(
            &self.name,
            &self.abbrev,
            &self.count_date_iso().unwrap_or_default(),
        )
    }

    /// Great-circle distance from the centre to `point`, in miles.
    pub fn distance_miles(&self, point: LatLon) -> Option<f64> {
        self.center.distance_miles(point)
    }

    /// Whether `point` lies inside the circle's buffer.
    pub fn contains(&self, point: LatLon) -> bool {
        self.distance_miles(point)
            .is_some_and(|d| d <= self.buffer_miles)
    }

    /// `Point Reyes (CAPR)` style label.
    pub fn label(&self) -> String {
        if self.abbrev.is_empty() || self.abbrev == self.name {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.abbrev)
        }
    }
}

impl RTreeObject for Circle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.center.0, self.center.1])
    }
}

/// Squared euclidean distance in degree space, used only for R-tree ordering.
impl PointDistance for Circle {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d_lat = self.center.0 - point[0];
        let d_lon = self.center.1 - point[1];
        d_lat * d_lat + d_lon * d_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle() -> Circle {
        Circle {
            id: "CAPR:38.07,-122.88".into(),
            name: "Point Reyes".into(),
            abbrev: "CAPR".into(),
            center: LatLon(38.07, -122.88),
            buffer_miles: DEFAULT_BUFFER_MILES,
            count_date: NaiveDate::from_ymd_opt(2024, 12, 21),
        }
    }

    #[test]
    fn test_contains_uses_buffer() {
        let c = circle();
        assert!(c.contains(LatLon(38.10, -122.88)));
        // ~13.8 mi north
        assert!(!c.contains(LatLon(38.27, -122.88)));
    }

    #[test]
    fn test_report_key_and_label() {
        let c = circle();
        assert_eq!(c.report_key().as_str(), "countday|Point Reyes|CAPR|2024-12-21");
        assert_eq!(c.label(), "Point Reyes (CAPR)");
        let undated = Circle {
            count_date: None,
            ..c
        };
        assert_eq!(undated.report_key().as_str(), "countday|Point Reyes|CAPR|");
    }
}
