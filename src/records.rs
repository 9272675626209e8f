//! Reviewing saved snapshots: loading with air quality back-fill, then
//! filtering, sorting and grouping.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::airquality::{Measurement, parse_timestamp};
use crate::services::records_api::{AirQualityQuery, RecordsApi, SavedRecord, UserStats};

/// A saved snapshot with its readings resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    pub record: SavedRecord,
    pub air_quality: Vec<Measurement>,
}

impl RecordEntry {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.record.created_at.as_deref().and_then(parse_timestamp)
    }

    pub fn country(&self) -> &str {
        self.record.country.as_deref().unwrap_or("Unknown Country")
    }
}

/// Lists saved snapshots. Those stored without air quality are looked up
/// again, all at once; a failed lookup leaves that record without readings.
pub async fn load_records(api: &dyn RecordsApi) -> Result<Vec<RecordEntry>> {
    let records = api.list_records().await?;
    debug!(count = records.len(), "Records fetched");
    Ok(join_all(records.into_iter().map(|record| resolve(api, record))).await)
}

async fn resolve(api: &dyn RecordsApi, record: SavedRecord) -> RecordEntry {
    if record.has_air_quality() {
        let air_quality = record.stored_readings();
        return RecordEntry { record, air_quality };
    }

    let label = record.place_label();
    let query = AirQualityQuery {
        city: Some(label.clone()).filter(|l| !l.is_empty()),
        country: Some(record.metadata.country_code.clone()).filter(|c| !c.is_empty()),
        ..AirQualityQuery::default()
    };

    let air_quality = match api.air_quality(&query).await {
        Ok(report) if !report.measurements.is_empty() => report.measurements,
        Ok(_) => {
            let fallback = record.fallback_readings();
            if fallback.is_empty() {
                debug!(record = %record.id, "No air quality available");
            } else {
                debug!(record = %record.id, "Using fallback air quality");
            }
            fallback
        }
        Err(e) => {
            warn!(record = %record.id, error = %e, "Air quality back-fill failed");
            Vec::new()
        }
    };
    RecordEntry { record, air_quality }
}

/// Stats for the header, zeros when the backend cannot say.
pub async fn stats_or_default(api: &dyn RecordsApi) -> UserStats {
    api.stats().await.unwrap_or_else(|e| {
        warn!(error = %e, "Stats unavailable");
        UserStats::default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Country,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Which saved snapshots to show and in what order. The default shows
/// everything, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    /// Case-insensitive substring of the country name.
    pub country: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl RecordQuery {
    pub fn matches(&self, entry: &RecordEntry) -> bool {
        if let Some(term) = self.country.as_deref().map(str::to_lowercase) {
            if !entry.country().to_lowercase().contains(&term) {
                return false;
            }
        }
        if self.since.is_some() || self.until.is_some() {
            let Some(created) = entry.created_at() else {
                return false;
            };
            if self.since.is_some_and(|since| created < since)
                || self.until.is_some_and(|until| created > until)
            {
                return false;
            }
        }
        true
    }

    /// Filters and sorts. Entries lacking the sort field go last either way.
    pub fn apply<'a>(&self, entries: &'a [RecordEntry]) -> Vec<&'a RecordEntry> {
        let mut out: Vec<&RecordEntry> = entries.iter().filter(|e| self.matches(e)).collect();
        match self.sort {
            SortKey::CreatedAt => sort_optional(&mut out, self.order, |e| e.created_at()),
            SortKey::Temperature => sort_optional(&mut out, self.order, |e| {
                e.record.weather.temperature.filter(|t| !t.is_nan())
            }),
            SortKey::Country => sort_optional(&mut out, self.order, |e| Some(e.country().to_lowercase())),
        }
        out
    }
}

fn sort_optional<K: PartialOrd>(
    entries: &mut [&RecordEntry],
    order: SortOrder,
    key: impl Fn(&RecordEntry) -> Option<K>,
) {
    entries.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Groups by country name, groups in alphabetical order, entries keeping
/// their order within each group.
pub fn group_by_country<'a>(entries: &[&'a RecordEntry]) -> BTreeMap<String, Vec<&'a RecordEntry>> {
    let mut groups: BTreeMap<String, Vec<&RecordEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.country().to_string()).or_default().push(*entry);
    }
    groups
}
