//! Canonical cloud-cover labels.
//!
//! Reports saved with older category sets use spellings like "Overcast" or
//! "BCFG". They are mapped onto the current [`CloudCover`] set here, with
//! anything unrecognised becoming `Unknown`.

use crate::types::categories::CloudCover;

/// Accepted spellings, compared after trimming and lowercasing.
const CLOUD_ALIASES: [(&str, CloudCover); 14] = [
    ("unknown", CloudCover::Unknown),
    ("clear", CloudCover::Clear),
    ("cavok", CloudCover::Clear),
    ("fog", CloudCover::Foggy),
    ("foggy", CloudCover::Foggy),
    ("local fog", CloudCover::LocalFog),
    ("localfog", CloudCover::LocalFog),
    ("bcfg", CloudCover::LocalFog),
    ("mostly clear", CloudCover::PartlyClear),
    ("partly clear", CloudCover::PartlyClear),
    ("partly cloudy", CloudCover::PartlyCloudy),
    ("mostly cloudy", CloudCover::Cloudy),
    ("overcast", CloudCover::Cloudy),
    ("cloudy", CloudCover::Cloudy),
];

/// Maps any stored cloud-cover label onto the canonical set.
///
/// ```
/// use cbc_weather::{canonical_cloud_cover, CloudCover};
///
/// assert_eq!(canonical_cloud_cover("Overcast"), CloudCover::Cloudy);
/// assert_eq!(canonical_cloud_cover("  mostly clear "), CloudCover::PartlyClear);
/// assert_eq!(canonical_cloud_cover("Drizzle"), CloudCover::Unknown);
/// ```
pub fn canonical_cloud_cover(label: &str) -> CloudCover {
    let needle = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    CLOUD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map_or(CloudCover::Unknown, |(_, cover)| *cover)
}

/// Canonical label text for a stored cloud-cover value.
pub fn canonical_cloud_label(label: &str) -> &'static str {
    canonical_cloud_cover(label).label()
}
