//! In-memory providers shared by the integration tests.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use geoinsight::airquality::Measurement;
use geoinsight::auth::Session;
use geoinsight::services::country_api::{CountryApi, CountryMetadata, CountrySummary};
use geoinsight::services::records_api::{
    AirQualityComparison, AirQualityQuery, AirQualityReport, HistoryPoint, RecordsApi,
    SavedRecord, Snapshot, UserStats,
};
use geoinsight::services::weather_api::{Weather, WeatherApi};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

pub fn session(claims: Value) -> Session {
    let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(claims.to_string()));
    Session::from_token(&token).unwrap()
}

pub fn reading(location: &str, parameter: &str, value: f64, at: &str) -> Measurement {
    Measurement {
        location_name: Some(location.to_string()),
        parameter: Some(parameter.to_string()),
        value,
        unit: Some("µg/m³".to_string()),
        measured_at: Some(at.to_string()),
        status: None,
        advisory: None,
    }
}

pub struct FakeCountries {
    pub metadata: CountryMetadata,
}

impl FakeCountries {
    pub fn colombo() -> Self {
        Self {
            metadata: CountryMetadata {
                capital: "Colombo".to_string(),
                country_code: "LK".to_string(),
                lat: Some(7.0),
                lon: Some(81.0),
                ..CountryMetadata::default()
            },
        }
    }
}

#[async_trait]
impl CountryApi for FakeCountries {
    async fn list_countries(&self) -> Result<Vec<CountrySummary>> {
        Ok(vec![CountrySummary::new("Sri Lanka", "Colombo", 22_000_000)])
    }

    async fn country_details(&self, name: &str) -> Result<CountryMetadata> {
        if name == "Sri Lanka" {
            Ok(self.metadata.clone())
        } else {
            Err(anyhow!("unknown country {name}"))
        }
    }
}

/// Waits on `barrier` (when set) before answering, so a caller that does not
/// run it alongside its partner never completes.
pub struct FakeWeather {
    pub barrier: Option<Arc<Barrier>>,
    pub fail: bool,
}

#[async_trait]
impl WeatherApi for FakeWeather {
    async fn current_weather(&self, _place: &CountryMetadata) -> Result<Weather> {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.fail {
            return Err(anyhow!("weather provider down"));
        }
        Ok(Weather {
            temperature: Some(31.0),
            humidity: Some(70.0),
            description: Some("scattered clouds".to_string()),
            ..Weather::default()
        })
    }
}

#[derive(Default)]
pub struct FakeRecords {
    pub barrier: Option<Arc<Barrier>>,
    pub report: Option<AirQualityReport>,
    pub records: Vec<SavedRecord>,
    pub queries: Mutex<Vec<AirQualityQuery>>,
    pub saved: Mutex<Vec<Snapshot>>,
}

impl FakeRecords {
    pub fn with_report(report: AirQualityReport) -> Self {
        Self {
            report: Some(report),
            ..Self::default()
        }
    }

    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| serde_json::from_value(r).unwrap())
                .collect(),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<AirQualityQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordsApi for FakeRecords {
    async fn air_quality(&self, query: &AirQualityQuery) -> Result<AirQualityReport> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        self.report
            .clone()
            .ok_or_else(|| anyhow!("air quality proxy down"))
    }

    async fn list_records(&self) -> Result<Vec<SavedRecord>> {
        Ok(self.records.clone())
    }

    async fn save_record(&self, snapshot: &Snapshot) -> Result<Value> {
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(json!({"_id": "new"}))
    }

    async fn delete_record(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn stats(&self) -> Result<UserStats> {
        Err(anyhow!("stats unavailable"))
    }

    async fn history(&self, _location: &str, _days: u32) -> Result<Vec<HistoryPoint>> {
        Ok(Vec::new())
    }

    async fn compare_air_quality(&self, _days: u32) -> Result<Vec<AirQualityComparison>> {
        Ok(Vec::new())
    }
}
