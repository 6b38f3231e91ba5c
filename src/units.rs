//! Numeric conversions shared by the station lookup and the count-day aggregation.
//!
//! Every conversion returns `None` for non-finite input so that "no data" flows
//! through the pipeline instead of turning into a bogus number.

/// Knots to statute miles per hour.
pub const MPH_PER_KNOT: f64 = 1.15078;

/// Kilometres to statute miles.
pub const MILES_PER_KM: f64 = 0.621371;

/// Converts degrees Celsius to degrees Fahrenheit.
///
/// ```
/// use cbc_weather::celsius_to_fahrenheit;
///
/// assert_eq!(celsius_to_fahrenheit(100.0), Some(212.0));
/// assert_eq!(celsius_to_fahrenheit(f64::NAN), None);
/// ```
pub fn celsius_to_fahrenheit(celsius: f64) -> Option<f64> {
    celsius.is_finite().then(|| celsius * 9.0 / 5.0 + 32.0)
}

/// Converts a wind speed in knots to miles per hour.
pub fn knots_to_mph(knots: f64) -> Option<f64> {
    knots.is_finite().then(|| knots * MPH_PER_KNOT)
}

/// Converts kilometres to statute miles.
pub fn km_to_miles(km: f64) -> Option<f64> {
    km.is_finite().then(|| km * MILES_PER_KM)
}

/// Approximates the UTC offset of a location from its longitude, at 15° per hour.
///
/// This ignores real timezone boundaries and daylight saving on purpose: the
/// same approximation is used for building the observation window and for
/// bucketing observations into the local day, so the two always agree.
/// Non-finite longitudes yield an offset of `0`.
pub fn approx_utc_offset_hours(longitude: f64) -> i32 {
    if !longitude.is_finite() {
        return 0;
    }
    // Half-up rounding so that e.g. -7.5 becomes -7, as a browser would do it.
    (longitude / 15.0 + 0.5).floor() as i32
}

/// Rounds to one decimal place, half-up, and normalises negative zero.
pub(crate) fn round_tenths(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0 + 0.0
}

/// Renders a value rounded to tenths without a trailing `.0` (`35.6`, `40`).
pub fn format_tenths(value: f64) -> String {
    format!("{}", round_tenths(value))
}
