//! Data types shared by the air-quality pipeline.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One pollutant reading at one station, in the uniform shape every view
/// consumes. Built fresh from each provider payload and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

impl Measurement {
    /// `measuredAt` as an instant, if it parses.
    pub fn measured_instant(&self) -> Option<DateTime<Utc>> {
        self.measured_at.as_deref().and_then(parse_timestamp)
    }

    /// Key used to keep one reading per station and pollutant.
    pub fn station_key(&self) -> String {
        format!(
            "{}-{}",
            self.location_name.as_deref().unwrap_or(""),
            self.parameter.as_deref().unwrap_or("")
        )
    }

    pub fn is_fine_particulate(&self) -> bool {
        self.parameter
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|p| p.contains("pm2.5") || p.contains("pm25"))
    }
}

/// Parses the timestamp spellings providers actually send.
///
/// Accepts RFC 3339, naive date-times and bare dates (read as UTC), and
/// integer epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

/// Severity tier derived from a free-text status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Good => "good",
            Tier::Moderate => "moderate",
            Tier::UnhealthySensitive => "unhealthy-sensitive",
            Tier::Unhealthy => "unhealthy",
            Tier::VeryUnhealthy => "very-unhealthy",
            Tier::Hazardous => "hazardous",
            Tier::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display attributes for a tier: the status badge palette, plus the
/// advisory panel's palette, icon and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierStyle {
    pub text_color: &'static str,
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub advisory_icon: &'static str,
    pub advisory_text: &'static str,
    pub advisory_background: &'static str,
    pub advisory_border: &'static str,
    pub advisory_text_color: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pm(parameter: &str) -> Measurement {
        Measurement {
            location_name: Some("A".into()),
            parameter: Some(parameter.into()),
            value: 1.0,
            unit: None,
            measured_at: None,
            status: None,
            advisory: None,
        }
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02"), Some(expected));
        assert_eq!(parse_timestamp("1704153600000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_fine_particulate_detection() {
        assert!(pm("pm25").is_fine_particulate());
        assert!(pm("PM2.5").is_fine_particulate());
        assert!(!pm("pm2_5").is_fine_particulate());
        assert!(!pm("no2").is_fine_particulate());
    }

    #[test]
    fn test_measurement_serializes_camel_case() {
        let mut m = pm("no2");
        m.measured_at = Some("2024-01-01T00:00:00Z".into());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["locationName"], "A");
        assert_eq!(json["measuredAt"], "2024-01-01T00:00:00Z");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_tier_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(Tier::UnhealthySensitive).unwrap(),
            "unhealthy-sensitive"
        );
        assert_eq!(Tier::VeryUnhealthy.to_string(), "very-unhealthy");
    }
}
