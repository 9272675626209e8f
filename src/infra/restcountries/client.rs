use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::error::GeoError;
use crate::fetch::{HttpClient, fetch_json};
use crate::services::country_api::{CountryApi, CountryMetadata, CountrySummary};

/// Client for the REST Countries v3.1 API.
pub struct RestCountriesClient<C> {
    http: C,
    base_url: String,
}

impl<C: HttpClient> RestCountriesClient<C> {
    pub fn new(http: C, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn details_url(&self, name: &str) -> Result<Url> {
        let mut url: Url = format!("{}/v3.1/name/", self.base_url).parse()?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .push(name);
        url.query_pairs_mut().append_pair("fullText", "true");
        Ok(url)
    }
}

fn text(item: &Value, pointer: &str) -> Option<String> {
    item.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn summary(item: &Value) -> Option<CountrySummary> {
    Some(CountrySummary {
        name: text(item, "/name/common")?,
        capital: text(item, "/capital/0").unwrap_or_else(|| "N/A".to_string()),
        population: item["population"].as_u64().unwrap_or(0),
    })
}

/// Maps one REST Countries entry onto [`CountryMetadata`], keeping the
/// defaults for anything missing.
pub(crate) fn metadata(item: &Value) -> CountryMetadata {
    let defaults = CountryMetadata::default();
    CountryMetadata {
        capital: text(item, "/capital/0").unwrap_or(defaults.capital),
        population: item["population"].as_u64().unwrap_or(0),
        currency: item["currencies"]
            .as_object()
            .and_then(|c| c.keys().next().cloned())
            .unwrap_or(defaults.currency),
        languages: item["languages"]
            .as_object()
            .map(|l| l.values().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        flag: text(item, "/flags/svg").unwrap_or_default(),
        region: text(item, "/region").unwrap_or(defaults.region),
        subregion: text(item, "/subregion").unwrap_or(defaults.subregion),
        lat: item.pointer("/latlng/0").and_then(Value::as_f64),
        lon: item.pointer("/latlng/1").and_then(Value::as_f64),
        country_code: text(item, "/cca2").unwrap_or_default(),
    }
}

#[async_trait]
impl<C: HttpClient> CountryApi for RestCountriesClient<C> {
    #[tracing::instrument(skip(self))]
    async fn list_countries(&self) -> Result<Vec<CountrySummary>> {
        let url = format!("{}/v3.1/all?fields=name,capital,population", self.base_url);
        let items: Vec<Value> = fetch_json(&self.http, &url).await?;

        let mut countries: Vec<CountrySummary> = items.iter().filter_map(summary).collect();
        countries.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        debug!(count = countries.len(), "Country list fetched");
        Ok(countries)
    }

    #[tracing::instrument(skip(self))]
    async fn country_details(&self, name: &str) -> Result<CountryMetadata> {
        let url = self.details_url(name)?;
        let items: Vec<Value> = match fetch_json(&self.http, url.as_str()).await {
            Ok(items) => items,
            Err(e) => match e.downcast_ref::<GeoError>() {
                Some(GeoError::Status { status: 404, .. }) => {
                    return Err(GeoError::CountryNotFound(name.to_string()).into());
                }
                _ => return Err(e),
            },
        };
        let first = items
            .first()
            .ok_or_else(|| GeoError::CountryNotFound(name.to_string()))?;
        Ok(metadata(first))
    }
}
