//! Raw station observations (METAR reports) as delivered by the observation service.
//!
//! Every field may be missing, and numbers sometimes arrive as strings, so decoding
//! is lenient: anything that does not read as a finite number becomes `None`
//! instead of failing the whole batch.

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reported wind direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum WindReading {
    /// Direction in degrees true.
    Degrees(f64),
    /// The station reported `VRB`.
    Variable,
}

/// One cloud layer of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CloudLayer {
    /// Coverage code: CLR, FEW, SCT, BKN, OVC, OVX or CAVOK.
    #[serde(default, deserialize_with = "lenient_string")]
    pub cover: Option<String>,
    /// Layer base in feet above ground, when reported.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base: Option<f64>,
}

impl CloudLayer {
    pub fn with_cover(cover: &str) -> Self {
        Self {
            cover: Some(cover.to_string()),
            base: None,
        }
    }
}

/// A single point-in-time station report.
///
/// ```
/// use cbc_weather::{CloudLayer, Observation, WindReading};
///
/// let report = Observation::builder()
///     .obs_time(1_734_789_600)
///     .temp_c(2.0)
///     .wind_speed_kt(10.0)
///     .wind_direction(WindReading::Degrees(270.0))
///     .wx_string("-RA".to_string())
///     .clouds(vec![CloudLayer::with_cover("OVC")])
///     .build();
/// assert_eq!(report.temp_c, Some(2.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Observation {
    /// Station identifier the report came from.
    #[serde(rename = "icaoId", default, deserialize_with = "lenient_string")]
    pub station_id: Option<String>,
    /// Observation instant, seconds since the Unix epoch (UTC).
    #[serde(rename = "obsTime", default, deserialize_with = "lenient_i64")]
    pub obs_time: Option<i64>,
    /// Air temperature in °C.
    #[serde(rename = "temp", default, deserialize_with = "lenient_f64")]
    pub temp_c: Option<f64>,
    /// Wind speed in knots.
    #[serde(rename = "wspd", default, deserialize_with = "lenient_f64")]
    pub wind_speed_kt: Option<f64>,
    #[serde(rename = "wdir", default, deserialize_with = "lenient_wind")]
    pub wind_direction: Option<WindReading>,
    /// Snow depth in inches.
    #[serde(rename = "snow", default, deserialize_with = "lenient_f64")]
    pub snow_depth_in: Option<f64>,
    /// Present-weather groups, e.g. `-RA BR` or `+SN FG`.
    #[serde(rename = "wxString", default, deserialize_with = "lenient_string")]
    pub wx_string: Option<String>,
    #[serde(default, deserialize_with = "lenient_layers")]
    #[builder(default)]
    pub clouds: Vec<CloudLayer>,
}

fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_wind<'de, D>(deserializer: D) -> Result<Option<WindReading>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("VRB") => {
            Some(WindReading::Variable)
        }
        Some(other) => number_from_value(&other).map(WindReading::Degrees),
        None => None,
    })
}

fn lenient_layers<'de, D>(deserializer: D) -> Result<Vec<CloudLayer>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<CloudLayer>(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_awc_metar_json() {
        let json = r#"[
            {"icaoId": "KSFO", "obsTime": 1734789600, "temp": 2.0, "wspd": 10, "wdir": 270,
             "wxString": "-RA", "clouds": [{"cover": "OVC", "base": 1200}]},
            {"icaoId": "KSFO", "obsTime": "1734800400", "temp": "4.4", "wspd": null, "wdir": "VRB",
             "clouds": "garbage"},
            {"obsTime": 1734811200, "temp": "M01", "wdir": "", "snow": 3, "clouds": [{"cover": "SCT"}, 7]}
        ]"#;
        let reports: Vec<Observation> = serde_json::from_str(json).unwrap();
        assert_eq!(reports.len(), 3);

        assert_eq!(reports[0].obs_time, Some(1_734_789_600));
        assert_eq!(reports[0].wind_speed_kt, Some(10.0));
        assert_eq!(reports[0].wind_direction, Some(WindReading::Degrees(270.0)));
        assert_eq!(reports[0].clouds[0].cover.as_deref(), Some("OVC"));
        assert_eq!(reports[0].clouds[0].base, Some(1200.0));

        assert_eq!(reports[1].obs_time, Some(1_734_800_400));
        assert_eq!(reports[1].temp_c, Some(4.4));
        assert_eq!(reports[1].wind_speed_kt, None);
        assert_eq!(reports[1].wind_direction, Some(WindReading::Variable));
        assert!(reports[1].clouds.is_empty());
        assert_eq!(reports[1].wx_string, None);

        assert_eq!(reports[2].station_id, None);
        assert_eq!(reports[2].temp_c, None);
        assert_eq!(reports[2].wind_direction, None);
        assert_eq!(reports[2].snow_depth_in, Some(3.0));
        assert_eq!(reports[2].clouds.len(), 1);
    }
}
