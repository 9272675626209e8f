//! "Get insights" for one country: details first, then weather and air
//! quality fetched side by side.

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::Session;
use crate::error::GeoError;
use crate::services::country_api::{CountryApi, CountryMetadata};
use crate::services::records_api::{AirQualityQuery, AirQualityReport, RecordsApi, Snapshot};
use crate::services::weather_api::{Weather, WeatherApi};

pub struct Dashboard<'a> {
    countries: &'a dyn CountryApi,
    /// `None` when no weather API key is configured.
    weather: Option<&'a dyn WeatherApi>,
    records: &'a dyn RecordsApi,
    session: Option<&'a Session>,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        countries: &'a dyn CountryApi,
        weather: Option<&'a dyn WeatherApi>,
        records: &'a dyn RecordsApi,
        session: Option<&'a Session>,
    ) -> Self {
        Self {
            countries,
            weather,
            records,
            session,
        }
    }

    /// Builds a [`Snapshot`] for `country`.
    ///
    /// Fails only when no country is given, nobody is logged in, or the
    /// country lookup fails. Weather and air quality degrade to placeholders.
    #[tracing::instrument(skip(self))]
    pub async fn insights(&self, country: &str) -> Result<Snapshot> {
        let country = country.trim();
        if country.is_empty() {
            return Err(GeoError::MissingCountry.into());
        }
        let session = self.session.ok_or(GeoError::NotAuthenticated)?;

        let metadata = self.countries.country_details(country).await?;
        let (weather, air_quality) =
            tokio::join!(self.weather_for(&metadata), self.air_quality_for(&metadata));

        info!(
            country,
            readings = air_quality.measurements.len(),
            fallback = air_quality.fallback,
            "Insights fetched"
        );

        Ok(Snapshot {
            country: country.to_string(),
            metadata,
            weather,
            air_quality: air_quality.measurements,
            air_quality_fallback: air_quality.fallback,
            fetched_at: Utc::now(),
            user_id: session.user_id().map(str::to_string),
        })
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<Value> {
        if self.session.is_none() {
            return Err(GeoError::NotAuthenticated.into());
        }
        let saved = self.records.save_record(snapshot).await?;
        info!(country = %snapshot.country, "Snapshot saved");
        Ok(saved)
    }

    async fn weather_for(&self, metadata: &CountryMetadata) -> Weather {
        let Some(api) = self.weather else {
            warn!("Missing OpenWeather key, weather unavailable");
            return Weather::unavailable();
        };
        match api.current_weather(metadata).await {
            Ok(weather) => weather,
            Err(e) => {
                warn!(error = %e, "Weather lookup failed");
                Weather::unavailable()
            }
        }
    }

    async fn air_quality_for(&self, metadata: &CountryMetadata) -> AirQualityReport {
        match self.records.air_quality(&AirQualityQuery::for_place(metadata)).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Air quality lookup failed");
                AirQualityReport::default()
            }
        }
    }
}
