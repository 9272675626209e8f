//! Current weather for a country's capital.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::country_api::CountryMetadata;
use super::lenient;

/// Current conditions in metric units. Temperatures are whole degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    #[serde(default, deserialize_with = "lenient::number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub feels_like: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub icon: Option<String>,
}

impl Weather {
    /// Placeholder shown when the weather provider cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            description: Some("Service unavailable".to_string()),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current_weather(&self, place: &CountryMetadata) -> Result<Weather>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_strings_read_as_absent() {
        let w: Weather = serde_json::from_str(
            r#"{"temperature":"N/A","humidity":"N/A","description":"Service unavailable"}"#,
        )
        .unwrap();
        assert_eq!(w, Weather::unavailable());
    }

    #[test]
    fn test_numbers_kept() {
        let w: Weather = serde_json::from_str(r#"{"temperature":31,"feelsLike":"35","icon":"01d"}"#).unwrap();
        assert_eq!(w.temperature, Some(31.0));
        assert_eq!(w.feels_like, Some(35.0));
        assert_eq!(w.icon.as_deref(), Some("01d"));
    }
}
