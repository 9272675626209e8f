//! Snapshot persistence, air quality lookups and analytics on the backend.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::country_api::CountryMetadata;
use super::lenient;
use super::weather_api::Weather;
use crate::airquality::{Measurement, Normalizer};

/// Everything the dashboard shows for one country at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub country: String,
    pub metadata: CountryMetadata,
    pub weather: Weather,
    pub air_quality: Vec<Measurement>,
    pub air_quality_fallback: bool,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A snapshot as stored by the backend.
///
/// `airQuality` is kept raw: older snapshots saved provider payloads as-is,
/// so it is read through the normalizer rather than deserialized directly.
/// `airQualityFallback` is either the flag saved by the dashboard or a list
/// of cached readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: Option<String>,
    #[serde(default)]
    pub metadata: CountryMetadata,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub air_quality: Value,
    #[serde(default)]
    pub air_quality_fallback: Value,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fetched_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

impl SavedRecord {
    /// Name used for display and as the location of synthesized readings:
    /// the capital when known, else the country.
    pub fn place_label(&self) -> String {
        self.metadata
            .known_capital()
            .map(str::to_string)
            .or_else(|| self.country.clone())
            .unwrap_or_default()
    }

    pub fn fallback_readings(&self) -> Vec<Measurement> {
        match &self.air_quality_fallback {
            Value::Array(_) => Normalizer::new().normalize(&self.air_quality_fallback),
            _ => Vec::new(),
        }
    }

    pub fn fallback_flag(&self) -> bool {
        self.air_quality_fallback.as_bool().unwrap_or(false)
    }

    /// Readings stored with the snapshot, normalized.
    pub fn stored_readings(&self) -> Vec<Measurement> {
        let label = self.place_label();
        let fallback = self.fallback_readings();
        Normalizer::new()
            .fallback_label(&label)
            .fallback(&fallback)
            .normalize(&self.air_quality)
    }

    pub fn has_air_quality(&self) -> bool {
        match &self.air_quality {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}

/// Query for the backend's air quality proxy. Unknown parts are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirQualityQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AirQualityQuery {
    pub fn for_place(metadata: &CountryMetadata) -> Self {
        let (lat, lon) = match metadata.coordinates() {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };
        Self {
            lat,
            lon,
            city: metadata.known_capital().map(str::to_string),
            country: Some(metadata.country_code.clone()).filter(|c| !c.is_empty()),
        }
    }

    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            pairs.push(("lat", lat.to_string()));
            pairs.push(("lon", lon.to_string()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        if let Some(country) = &self.country {
            pairs.push(("country", country.clone()));
        }
        pairs
    }
}

/// Normalized answer of the air quality proxy. `fallback` is set when the
/// provider found no station near the requested place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirQualityReport {
    pub measurements: Vec<Measurement>,
    pub fallback: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_records: u64,
    pub unique_countries_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryMeta {
    #[serde(deserialize_with = "lenient::text")]
    pub capital: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub country: Option<String>,
}

/// One saved observation in a location's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(default, deserialize_with = "lenient::text")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub meta: HistoryMeta,
}

/// PM2.5 summary for one capital over the comparison window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityComparison {
    pub capital: String,
    #[serde(rename = "avgPM25", default, deserialize_with = "lenient::number")]
    pub avg_pm25: Option<f64>,
    #[serde(rename = "maxPM25", default, deserialize_with = "lenient::number")]
    pub max_pm25: Option<f64>,
}

/// Analytics windows offered by the backend, in days.
pub const HISTORY_WINDOWS: &[u32] = &[7, 14, 30];

#[async_trait::async_trait]
pub trait RecordsApi: Send + Sync {
    async fn air_quality(&self, query: &AirQualityQuery) -> Result<AirQualityReport>;

    async fn list_records(&self) -> Result<Vec<SavedRecord>>;

    async fn save_record(&self, snapshot: &Snapshot) -> Result<Value>;

    async fn delete_record(&self, id: &str) -> Result<()>;

    async fn stats(&self) -> Result<UserStats>;

    async fn history(&self, location: &str, days: u32) -> Result<Vec<HistoryPoint>>;

    async fn compare_air_quality(&self, days: u32) -> Result<Vec<AirQualityComparison>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_saved_record_reads_legacy_payloads() {
        let record: SavedRecord = serde_json::from_value(json!({
            "_id": "r1",
            "country": "Sri Lanka",
            "metadata": {"capital": "Colombo", "countryCode": "LK"},
            "weather": {"temperature": "N/A"},
            "airQuality": {"pm25": 18},
            "airQualityFallback": false,
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let readings = record.stored_readings();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].location_name.as_deref(), Some("Colombo"));
        assert_eq!(record.weather.temperature, None);
        assert!(!record.fallback_flag());
    }

    #[test]
    fn test_fallback_list_used_when_stored_empty() {
        let record: SavedRecord = serde_json::from_value(json!({
            "_id": "r2",
            "airQuality": [],
            "airQualityFallback": [{"parameter": "pm25", "value": 4, "location": "Cache"}]
        }))
        .unwrap();
        assert!(!record.has_air_quality());
        let readings = record.stored_readings();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].location_name.as_deref(), Some("Cache"));
    }

    #[test]
    fn test_query_pairs_skip_unknown_parts() {
        let metadata = CountryMetadata {
            capital: "N/A".into(),
            country_code: "LK".into(),
            lat: Some(7.0),
            lon: None,
            ..CountryMetadata::default()
        };
        let pairs = AirQualityQuery::for_place(&metadata).pairs();
        assert_eq!(pairs, vec![("country", "LK".to_string())]);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = Snapshot {
            country: "India".into(),
            metadata: CountryMetadata::default(),
            weather: Weather::unavailable(),
            air_quality: Vec::new(),
            air_quality_fallback: true,
            fetched_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            user_id: Some("u1".into()),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["airQualityFallback"], true);
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["metadata"]["countryCode"], "");
    }
}
