use crate::units::approx_utc_offset_hours;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fmt;
use std::fmt::{Display, Formatter};

/// A span of observation history to request: `hours` hours ending at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationWindow {
    pub end: DateTime<Utc>,
    pub hours: u32,
}

impl ObservationWindow {
    /// Window ending at local 23:59:59 of `date`, with the local offset
    /// approximated from `station_longitude`.
    ///
    /// ```
    /// use cbc_weather::ObservationWindow;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
    /// let window = ObservationWindow::for_count_day(date, -122.0, 30).unwrap();
    /// assert_eq!(window.end_iso(), "2024-12-22T07:59:59Z");
    /// ```
    pub fn for_count_day(date: NaiveDate, station_longitude: f64, hours: u32) -> Option<Self> {
        let offset = approx_utc_offset_hours(station_longitude);
        let local_end = date.and_hms_opt(23, 59, 59)?.and_utc();
        let end = local_end.checked_sub_signed(Duration::hours(i64::from(offset)))?;
        Some(Self { end, hours })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.end - Duration::hours(i64::from(self.hours))
    }

    /// End instant as ISO-8601 UTC with a `Z` suffix.
    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl Display for ObservationWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}h ending {}", self.hours, self.end_iso())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_covers_local_day() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let window = ObservationWindow::for_count_day(date, -122.0, 30).unwrap();
        let local_midnight_utc = date.and_hms_opt(8, 0, 0).unwrap().and_utc();
        assert!(window.start() < local_midnight_utc);
        assert_eq!(window.to_string(), "30h ending 2024-12-22T07:59:59Z");
    }

    #[test]
    fn test_east_of_greenwich() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let window = ObservationWindow::for_count_day(date, 30.0, 24).unwrap();
        assert_eq!(window.end_iso(), "2024-01-01T21:59:59Z");
    }
}
