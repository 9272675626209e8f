//! Terminal rendering of the dashboard cards, CSV export of saved records,
//! and writing database exports to disk.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::airquality::{AirQualityView, Tier, classify, select_latest};
use crate::auth::DbScope;
use crate::records::RecordEntry;
use crate::services::country_api::CountryMetadata;
use crate::services::records_api::{Snapshot, UserStats};
use crate::services::weather_api::Weather;

fn or_na(value: Option<f64>, suffix: &str) -> String {
    value
        .map(|v| format!("{v:.0}{suffix}"))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn render_country(country: &str, metadata: &CountryMetadata) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🏳️  {country}");
    let _ = writeln!(out, "   Capital:     {}", metadata.capital);
    let _ = writeln!(out, "   Population:  {}", metadata.population);
    let _ = writeln!(out, "   Currency:    {}", metadata.currency);
    let languages = if metadata.languages.is_empty() {
        "N/A".to_string()
    } else {
        metadata.languages.join(", ")
    };
    let _ = writeln!(out, "   Languages:   {languages}");
    let _ = writeln!(out, "   Region:      {} / {}", metadata.region, metadata.subregion);
    out
}

pub fn render_weather(capital: &str, weather: &Weather) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🌤️  Weather in {capital}");
    let _ = writeln!(
        out,
        "   {} (feels like {})",
        or_na(weather.temperature, "°C"),
        or_na(weather.feels_like, "°C")
    );
    let _ = writeln!(out, "   Humidity:    {}", or_na(weather.humidity, "%"));
    let _ = writeln!(out, "   Pressure:    {}", or_na(weather.pressure, " hPa"));
    if let Some(description) = &weather.description {
        let _ = writeln!(out, "   {description}");
    }
    out
}

pub fn render_air_quality(view: &AirQualityView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "💨 Air Quality");
    match view {
        AirQualityView::Empty { fallback, message } => {
            let icon = if *fallback { "⚠️ " } else { "" };
            let _ = writeln!(out, "   {icon}{message}");
        }
        AirQualityView::Reading(reading) => {
            let unit = reading.unit.as_deref().unwrap_or("");
            let _ = writeln!(out, "   {} {unit}", reading.value);
            if let Some(status) = &reading.status {
                let _ = writeln!(out, "   [{status}] ({})", reading.classification.tier);
            }
            if !reading.classification.advisory.is_empty() {
                let _ = writeln!(
                    out,
                    "   {} {}",
                    reading.classification.style.advisory_icon, reading.classification.advisory
                );
            }
            if let Some(parameter) = &reading.parameter {
                let _ = writeln!(out, "   Measuring: {parameter}");
            }
        }
    }
    out
}

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let view = AirQualityView::build(&snapshot.air_quality, snapshot.air_quality_fallback);
    [
        render_country(&snapshot.country, &snapshot.metadata),
        render_weather(&snapshot.metadata.capital, &snapshot.weather),
        render_air_quality(&view),
    ]
    .join("\n")
}

pub fn render_record(entry: &RecordEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "── {} [{}]", entry.country(), entry.record.id);
    if let Some(created) = entry.created_at() {
        let _ = writeln!(out, "   Saved: {}", created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let view = AirQualityView::build(&entry.air_quality, entry.record.fallback_flag());
    out.push_str(&render_country(entry.country(), &entry.record.metadata));
    out.push_str(&render_weather(&entry.record.metadata.capital, &entry.record.weather));
    out.push_str(&render_air_quality(&view));
    out
}

fn plural(n: u64, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

pub fn render_stats(stats: &UserStats) -> String {
    format!(
        "📊 {} · 🗺️ {}",
        plural(stats.total_records, "saved record", "saved records"),
        plural(stats.unique_countries_count, "country explored", "countries explored")
    )
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One CSV row per saved record, carrying its headline air quality reading.
#[derive(Debug, Default, Serialize)]
pub struct RecordRow {
    pub id: String,
    pub country: String,
    pub capital: String,
    pub created_at: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub weather: Option<String>,
    pub aq_parameter: Option<String>,
    pub aq_value: Option<f64>,
    pub aq_unit: Option<String>,
    pub aq_status: Option<String>,
    pub aq_tier: Option<Tier>,
    pub aq_readings: usize,
}

impl RecordRow {
    pub fn from_entry(entry: &RecordEntry) -> Self {
        let selection = select_latest(&entry.air_quality);
        let primary = selection.primary();
        Self {
            id: entry.record.id.clone(),
            country: entry.country().to_string(),
            capital: entry.record.metadata.capital.clone(),
            created_at: entry.record.created_at.clone(),
            temperature: entry.record.weather.temperature,
            humidity: entry.record.weather.humidity,
            weather: entry.record.weather.description.clone(),
            aq_parameter: primary.and_then(|m| m.parameter.clone()),
            aq_value: primary.map(|m| m.value),
            aq_unit: primary.and_then(|m| m.unit.clone()),
            aq_status: primary.and_then(|m| m.status.clone()),
            aq_tier: primary.map(|m| classify(m.status.as_deref())),
            aq_readings: selection.latest.len(),
        }
    }
}

/// Appends a row to a CSV file, writing the header only when the file is new.
pub fn append_record(path: &Path, row: &impl Serialize) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}

/// File name the backend's export is saved under.
pub fn export_file_name(scope: DbScope, now: DateTime<Utc>) -> String {
    match scope {
        DbScope::Full => format!("geoinsight_export_{}.json", now.timestamp_millis()),
        DbScope::Own => "geoinsight_user_export.json".to_string(),
    }
}

/// Writes an export into `dir`, gzip-compressed (with a `.gz` suffix) when
/// asked. Returns the path written.
pub fn write_export(dir: &Path, file_name: &str, contents: &[u8], gzip: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let (path, body) = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents)?;
        (dir.join(format!("{file_name}.gz")), encoder.finish()?)
    } else {
        (dir.join(file_name), contents.to_vec())
    };
    fs::write(&path, body)?;
    info!(path = %path.display(), bytes = contents.len(), gzip, "Export written");
    Ok(path)
}
