//! Country lookup.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One entry of the country picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub name: String,
    pub capital: String,
    pub population: u64,
}

impl CountrySummary {
    pub fn new(name: &str, capital: &str, population: u64) -> Self {
        Self {
            name: name.to_string(),
            capital: capital.to_string(),
            population,
        }
    }
}

/// Details shown on the country card and stored with each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountryMetadata {
    pub capital: String,
    pub population: u64,
    pub currency: String,
    pub languages: Vec<String>,
    pub flag: String,
    pub region: String,
    pub subregion: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub country_code: String,
}

impl Default for CountryMetadata {
    fn default() -> Self {
        Self {
            capital: "N/A".to_string(),
            population: 0,
            currency: "N/A".to_string(),
            languages: Vec::new(),
            flag: String::new(),
            region: "N/A".to_string(),
            subregion: "N/A".to_string(),
            lat: None,
            lon: None,
            country_code: String::new(),
        }
    }
}

impl CountryMetadata {
    /// The capital, unless it is the `N/A` placeholder.
    pub fn known_capital(&self) -> Option<&str> {
        Some(self.capital.as_str()).filter(|c| !c.is_empty() && *c != "N/A")
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

#[async_trait::async_trait]
pub trait CountryApi: Send + Sync {
    /// All countries, sorted by name.
    async fn list_countries(&self) -> Result<Vec<CountrySummary>>;

    /// Details for an exact country name.
    async fn country_details(&self, name: &str) -> Result<CountryMetadata>;
}
