use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::fetch::auth::UrlParam;
use crate::fetch::{HttpClient, fetch_json};
use crate::services::country_api::CountryMetadata;
use crate::services::weather_api::{Weather, WeatherApi};

/// OpenWeatherMap "current weather" client. The API key travels as the
/// `appid` query parameter.
pub struct OpenWeatherClient<C> {
    http: UrlParam<C>,
    base_url: String,
}

impl<C: HttpClient> OpenWeatherClient<C> {
    pub fn new(http: C, base_url: &str, api_key: &str) -> Self {
        Self {
            http: UrlParam::new(http, "appid", api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Coordinates when both are known, else the capital by name.
    fn weather_url(&self, place: &CountryMetadata) -> Result<Url> {
        let mut url: Url = format!("{}/data/2.5/weather", self.base_url).parse()?;
        {
            let mut query = url.query_pairs_mut();
            match place.coordinates() {
                Some((lat, lon)) => {
                    query
                        .append_pair("lat", &lat.to_string())
                        .append_pair("lon", &lon.to_string());
                }
                None => {
                    query.append_pair("q", &place.capital);
                }
            }
            query.append_pair("units", "metric");
        }
        Ok(url)
    }
}

pub(crate) fn weather_from(body: &Value) -> Weather {
    Weather {
        temperature: body.pointer("/main/temp").and_then(Value::as_f64).map(f64::round),
        feels_like: body
            .pointer("/main/feels_like")
            .and_then(Value::as_f64)
            .map(f64::round),
        humidity: body.pointer("/main/humidity").and_then(Value::as_f64),
        pressure: body.pointer("/main/pressure").and_then(Value::as_f64),
        description: body
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .map(str::to_string),
        icon: body
            .pointer("/weather/0/icon")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

#[async_trait]
impl<C: HttpClient> WeatherApi for OpenWeatherClient<C> {
    #[tracing::instrument(skip(self, place), fields(capital = %place.capital))]
    async fn current_weather(&self, place: &CountryMetadata) -> Result<Weather> {
        let url = self.weather_url(place)?;
        let body: Value = fetch_json(&self.http, url.as_str()).await?;
        Ok(weather_from(&body))
    }
}
