//! Placing UTC observation instants into the local count day.

use crate::types::categories::HalfDay;
use chrono::NaiveDate;

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Where an observation falls inside the local count day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDaySlot {
    /// Local hour, `0..24`.
    pub hour: u32,
    pub half: HalfDay,
}

/// Classifies an observation instant against a local calendar date.
///
/// `date` is a local calendar date, so the UTC offset is applied to the
/// observation rather than to the day boundary. Returns `None` when the
/// observation falls outside `[00:00, 24:00)` local time on that date.
///
/// ```
/// use cbc_weather::{classify_local_day, HalfDay};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
/// // 14:00 UTC is 06:00 at UTC-8.
/// let slot = classify_local_day(1_734_789_600, date, -8).unwrap();
/// assert_eq!(slot.hour, 6);
/// assert_eq!(slot.half, HalfDay::Am);
/// ```
pub fn classify_local_day(
    obs_time_epoch_seconds: i64,
    date: NaiveDate,
    utc_offset_hours: i32,
) -> Option<LocalDaySlot> {
    let day_start_ms = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
    let obs_local_ms = obs_time_epoch_seconds
        .checked_mul(1000)?
        .checked_add(i64::from(utc_offset_hours) * MS_PER_HOUR)?;
    let delta_ms = obs_local_ms.checked_sub(day_start_ms)?;
    if !(0..MS_PER_DAY).contains(&delta_ms) {
        return None;
    }
    let hour = (delta_ms / MS_PER_HOUR) as u32;
    Some(LocalDaySlot {
        hour,
        half: HalfDay::from_local_hour(hour),
    })
}
