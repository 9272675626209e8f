//! What an air-quality card shows: the headline reading with its styling, or
//! an explicit empty state.

use serde::Serialize;

use super::classify::{Classification, classify_measurement};
use super::select::select_latest;
use super::types::Measurement;

pub const NO_STATIONS_MESSAGE: &str = "No air quality monitoring stations found for this location.";
pub const NO_MEASUREMENTS_MESSAGE: &str = "No air quality measurements available at this time.";

/// Formats a reading: three decimals below 1, one decimal otherwise, `-`
/// when absent.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v < 1.0 => format!("{v:.3}"),
        Some(v) => format!("{v:.1}"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AirQualityView {
    /// `fallback` marks that the provider itself reported no nearby station.
    Empty { fallback: bool, message: &'static str },
    Reading(ReadingView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingView {
    pub value: String,
    pub unit: Option<String>,
    pub status: Option<String>,
    /// Upper-cased pollutant code, e.g. `PM25`.
    pub parameter: Option<String>,
    pub location: Option<String>,
    pub classification: Classification,
    /// Readings left after keeping the latest per station and pollutant.
    pub readings: usize,
}

impl AirQualityView {
    pub fn build(measurements: &[Measurement], fallback: bool) -> Self {
        let selection = select_latest(measurements);
        let Some(primary) = selection.primary() else {
            let message = if fallback {
                NO_STATIONS_MESSAGE
            } else {
                NO_MEASUREMENTS_MESSAGE
            };
            return AirQualityView::Empty { fallback, message };
        };

        AirQualityView::Reading(ReadingView {
            value: format_value(Some(primary.value)),
            unit: primary.unit.clone(),
            status: primary.status.clone(),
            parameter: primary.parameter.as_deref().map(str::to_uppercase),
            location: primary.location_name.clone(),
            classification: classify_measurement(primary),
            readings: selection.latest.len(),
        })
    }
}
