//! Turns whatever an air-quality endpoint returned into [`Measurement`]s.
//!
//! Payload shapes are recognised by an ordered list of matchers
//! ([`SHAPE_MATCHERS`]); fields are read through ordered alias tables
//! resolved by [`resolve`]. Nothing here fails: an unexpected shape simply
//! yields no candidates.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use tracing::trace;

use super::types::Measurement;

/// Outcome of trying one payload shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeMatch {
    Matched(Vec<Value>),
    NoMatch,
}

pub type ShapeMatcher = fn(&Value) -> ShapeMatch;

/// Tried in order; the first [`ShapeMatch::Matched`] wins.
pub const SHAPE_MATCHERS: &[(&str, ShapeMatcher)] = &[
    ("array", match_array),
    ("results", match_results),
    ("data", match_data),
    ("measurements", match_measurements),
    ("results.measurements", match_nested_measurements),
    (SINGLE_RECORD_SHAPE, match_single_record),
];

pub fn match_array(payload: &Value) -> ShapeMatch {
    array_at(payload, "")
}

pub fn match_results(payload: &Value) -> ShapeMatch {
    array_at(payload, "results")
}

pub fn match_data(payload: &Value) -> ShapeMatch {
    array_at(payload, "data")
}

pub fn match_measurements(payload: &Value) -> ShapeMatch {
    array_at(payload, "measurements")
}

pub fn match_nested_measurements(payload: &Value) -> ShapeMatch {
    array_at(payload, "results.measurements")
}

/// A non-empty object is taken as one record.
pub fn match_single_record(payload: &Value) -> ShapeMatch {
    match payload.as_object() {
        Some(map) if !map.is_empty() => ShapeMatch::Matched(vec![payload.clone()]),
        _ => ShapeMatch::NoMatch,
    }
}

fn array_at(payload: &Value, path: &str) -> ShapeMatch {
    match lookup(payload, path).and_then(Value::as_array) {
        Some(items) => ShapeMatch::Matched(items.clone()),
        None => ShapeMatch::NoMatch,
    }
}

/// Name of the matcher that takes a whole object as one record.
pub const SINGLE_RECORD_SHAPE: &str = "single-record";

/// Runs [`SHAPE_MATCHERS`] and returns the winning shape with its candidates.
pub fn matched_shape(payload: &Value) -> Option<(&'static str, Vec<Value>)> {
    SHAPE_MATCHERS.iter().find_map(|(name, matcher)| match matcher(payload) {
        ShapeMatch::Matched(items) => {
            trace!(shape = name, count = items.len(), "Air quality payload shape matched");
            Some((*name, items))
        }
        ShapeMatch::NoMatch => None,
    })
}

/// The winning shape's candidates, empty when nothing matched.
pub fn candidates(payload: &Value) -> Vec<Value> {
    matched_shape(payload).map(|(_, items)| items).unwrap_or_default()
}

pub const LOCATION_ALIASES: &[&str] = &["location", "station", "city", "locationName", "name"];
pub const PARAMETER_ALIASES: &[&str] = &["parameter", "param", "pollutant", "name"];
pub const MEASURED_AT_ALIASES: &[&str] = &[
    "measuredAt",
    "date.utc",
    "date",
    "timestamp",
    "datetime",
    "measured_at",
];
pub const VALUE_ALIASES: &[&str] = &["value", "measurement", "avg", "concentration"];
pub const UNIT_ALIASES: &[&str] = &["unit", "u", "measurementUnit"];
pub const STATUS_ALIASES: &[&str] = &["category", "status", "aqiCategory"];
pub const ADVISORY_ALIASES: &[&str] = &["description", "advisory"];

/// Pollutant keys recognised in a flat `{ "pm25": 12, "no2": 7 }` payload.
pub const FLAT_POLLUTANT_KEYS: &[&str] = &["pm25", "pm2_5", "pm10", "no2", "so2", "o3", "co", "aqi"];

pub const DEFAULT_UNIT: &str = "µg/m³";

/// Follows a dotted path (`"date.utc"`); the empty path is the value itself.
/// JSON `null` counts as absent.
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = value;
    if !path.is_empty() {
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
    }
    (!current.is_null()).then_some(current)
}

/// First alias that is present, non-null and accepted by `extract`.
pub fn resolve<T>(
    record: &Value,
    aliases: &[&str],
    extract: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    aliases
        .iter()
        .filter_map(|alias| lookup(record, alias))
        .find_map(extract)
}

/// Non-empty strings as-is, numbers in their decimal form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers, or strings that parse as one.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Maps one candidate record onto a [`Measurement`]; `None` when it carries
/// no usable value.
pub fn map_record(record: &Value) -> Option<Measurement> {
    let value = resolve(record, VALUE_ALIASES, as_number)?;

    let status = resolve(record, STATUS_ALIASES, as_label).or_else(|| {
        lookup(record, "aqi")
            .filter(|aqi| is_truthy(aqi))
            .and_then(as_text)
            .map(|aqi| format!("AQI {aqi}"))
    });

    Some(Measurement {
        location_name: resolve(record, LOCATION_ALIASES, as_text),
        parameter: resolve(record, PARAMETER_ALIASES, as_text),
        value,
        unit: resolve(record, UNIT_ALIASES, as_text),
        measured_at: resolve(record, MEASURED_AT_ALIASES, as_text),
        status,
        advisory: resolve(record, ADVISORY_ALIASES, as_label),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Normalization with caller-supplied fallbacks.
///
/// `fallback_label` names the location of records synthesized from a flat
/// pollutant map that carries no `location` of its own. `fallback` is
/// returned when nothing usable was found.
#[derive(Debug, Clone)]
pub struct Normalizer<'a> {
    fallback_label: Option<&'a str>,
    fallback: &'a [Measurement],
    now: DateTime<Utc>,
}

impl Default for Normalizer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Normalizer<'a> {
    pub fn new() -> Self {
        Self {
            fallback_label: None,
            fallback: &[],
            now: Utc::now(),
        }
    }

    pub fn fallback_label(mut self, label: &'a str) -> Self {
        self.fallback_label = Some(label);
        self
    }

    pub fn fallback(mut self, fallback: &'a [Measurement]) -> Self {
        self.fallback = fallback;
        self
    }

    /// Timestamp given to flat-map readings that carry none.
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn normalize(&self, payload: &Value) -> Vec<Measurement> {
        let (shape, items) = matched_shape(payload).unwrap_or_default();
        let mut measurements: Vec<Measurement> = items.iter().filter_map(map_record).collect();

        // A list shape with entries is authoritative even when none of them
        // carry a value; only an empty list or a bare object reads flat keys.
        let flat_allowed = items.is_empty() || shape == SINGLE_RECORD_SHAPE;
        if measurements.is_empty() && flat_allowed {
            if let Some(map) = payload.as_object() {
                measurements = self
                    .flat_pollutants(map)
                    .iter()
                    .filter_map(map_record)
                    .collect();
            }
        }

        if measurements.is_empty() && !self.fallback.is_empty() {
            trace!(count = self.fallback.len(), "Using fallback air quality readings");
            return self.fallback.to_vec();
        }
        measurements
    }

    /// One synthetic record per pollutant key present in a flat map.
    fn flat_pollutants(&self, map: &Map<String, Value>) -> Vec<Value> {
        let unit = map
            .get("unit")
            .and_then(as_label)
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());
        let measured_at = ["timestamp", "date"]
            .iter()
            .find_map(|k| map.get(*k).and_then(as_text))
            .unwrap_or_else(|| self.now.to_rfc3339());
        let location = map
            .get("location")
            .and_then(as_label)
            .or_else(|| self.fallback_label.map(str::to_string));
        let description = map.get("message").and_then(as_label);

        FLAT_POLLUTANT_KEYS
            .iter()
            .filter_map(|key| {
                let value = map.get(*key).filter(|v| !v.is_null())?;
                Some(json!({
                    "parameter": key,
                    "value": value,
                    "unit": unit,
                    "measuredAt": measured_at,
                    "location": location,
                    "description": description,
                }))
            })
            .collect()
    }
}

/// [`Normalizer`] with no fallbacks.
pub fn normalize(payload: &Value) -> Vec<Measurement> {
    Normalizer::new().normalize(payload)
}
