use crate::prefill::canonical::canonical_cloud_label;
use crate::types::report::{DerivedReportPatch, ReportField, ReportForm};

/// Merges a derived patch into a report form without overwriting user input.
///
/// A field takes the derived value only while it is exactly empty or
/// `"Unknown"`. Afterwards both cloud-cover fields are canonicalized whether or
/// not the patch touched them, so a label outside the canonical set becomes
/// `Unknown` (and is open to the next merge). For forms whose cloud fields are
/// canonical, merging the same patch twice gives the same form as merging once.
///
/// ```
/// use cbc_weather::{merge_prefill, ReportForm};
///
/// let mut form = ReportForm::default();
/// form.temp_min_f = "28".to_string();
/// form.cloud_cover_pm = "Overcast".to_string();
/// let merged = merge_prefill(&form, None);
/// assert_eq!(merged.temp_min_f, "28");
/// assert_eq!(merged.cloud_cover_pm, "Cloudy");
/// ```
pub fn merge_prefill(current: &ReportForm, patch: Option<&DerivedReportPatch>) -> ReportForm {
    let mut next = current.clone();
    if let Some(patch) = patch {
        for (field, value) in patch.form_values() {
            if next.is_fillable(field) {
                next.set(field, value);
            }
        }
    }
    canonicalize_cloud_fields(&mut next);
    next
}

/// Rewrites both cloud-cover fields to their canonical labels.
pub fn canonicalize_cloud_fields(form: &mut ReportForm) {
    for field in [ReportField::CloudCoverAm, ReportField::CloudCoverPm] {
        let canonical = canonical_cloud_label(form.get(field));
        form.set(field, canonical);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::categories::{CloudCover, Intensity, WindDirection};
    use crate::types::report::{HalfDaySummary, ValueRange};

    fn patch() -> DerivedReportPatch {
        DerivedReportPatch {
            temperature_f: Some(ValueRange { min: 35.6, max: 44.6 }),
            wind_mph: Some(ValueRange { min: 9.2, max: 13.8 }),
            snow_depth_in: None,
            wind_direction: WindDirection::mean(270.0),
            am: HalfDaySummary {
                cloud_cover: CloudCover::Cloudy,
                rain: Intensity::Light,
                snow: Intensity::None,
            },
            pm: HalfDaySummary {
                cloud_cover: CloudCover::Foggy,
                rain: Intensity::None,
                snow: Intensity::None,
            },
            used_count: 3,
        }
    }

    #[test]
    fn test_fills_default_form() {
        let merged = merge_prefill(&ReportForm::default(), Some(&patch()));
        assert_eq!(merged.temp_min_f, "35.6");
        assert_eq!(merged.temp_max_f, "44.6");
        assert_eq!(merged.wind_min_mph, "9.2");
        assert_eq!(merged.wind_max_mph, "13.8");
        assert_eq!(merged.wind_dir, "W");
        assert_eq!(merged.cloud_cover_am, "Cloudy");
        assert_eq!(merged.cloud_cover_pm, "Foggy");
        assert_eq!(merged.am_rain, "Light");
        assert_eq!(merged.pm_rain, "None");
        // Absent in the patch, so left as they were.
        assert_eq!(merged.snow_min_in, "");
        assert_eq!(merged.still_water, "Unknown");
    }

    #[test]
    fn test_user_values_win() {
        let mut form = ReportForm::default();
        form.temp_min_f = "30".into();
        form.wind_dir = "Calm".into();
        form.am_rain = "Heavy".into();
        form.cloud_cover_am = "Partly Clear".into();
        form.weather = "Drizzle early".into();

        let merged = merge_prefill(&form, Some(&patch()));
        assert_eq!(merged.temp_min_f, "30");
        assert_eq!(merged.wind_dir, "Calm");
        assert_eq!(merged.am_rain, "Heavy");
        assert_eq!(merged.cloud_cover_am, "Partly Clear");
        assert_eq!(merged.weather, "Drizzle early");
        assert_eq!(merged.temp_max_f, "44.6");
    }

    #[test]
    fn test_whitespace_only_is_kept() {
        let mut form = ReportForm::default();
        form.temp_max_f = "   ".into();
        form.wind_dir = " ".into();
        let merged = merge_prefill(&form, Some(&patch()));
        assert_eq!(merged.temp_max_f, "   ");
        assert_eq!(merged.wind_dir, " ");
        assert_eq!(merged.temp_min_f, "35.6");
    }

    #[test]
    fn test_idempotent() {
        let mut form = ReportForm::default();
        form.wind_max_mph = "20".into();
        form.cloud_cover_pm = "mostly cloudy".into();
        let once = merge_prefill(&form, Some(&patch()));
        let twice = merge_prefill(&once, Some(&patch()));
        assert_eq!(once, twice);
        assert_eq!(once.cloud_cover_pm, "Cloudy");
    }

    #[test]
    fn test_unrecognised_cloud_label_is_not_filled() {
        let mut form = ReportForm::default();
        form.cloud_cover_am = "Sunny".into();
        let merged = merge_prefill(&form, Some(&patch()));
        // The user's label blocks the derived value, then normalizes away.
        assert_eq!(merged.cloud_cover_am, "Unknown");
        assert_eq!(merged.cloud_cover_pm, "Foggy");
        assert_eq!(merge_prefill(&form, None).cloud_cover_am, "Unknown");
    }

    #[test]
    fn test_legacy_cloud_label_is_kept_canonically() {
        let mut form = ReportForm::default();
        form.cloud_cover_pm = "mostly clear".into();
        let merged = merge_prefill(&form, Some(&patch()));
        assert_eq!(merged.cloud_cover_pm, "Partly Clear");
        assert_eq!(merge_prefill(&merged, Some(&patch())), merged);
    }
}
