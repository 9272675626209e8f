//! Latest reading per station/pollutant, and the headline reading.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::types::Measurement;

/// Result of [`select_latest`]: newest-first readings, one per station key,
/// and the index of the headline reading within them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub latest: Vec<Measurement>,
    pub primary: Option<usize>,
}

impl Selection {
    pub fn primary(&self) -> Option<&Measurement> {
        self.primary.and_then(|i| self.latest.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

/// Keeps the most recent reading for every `location-parameter` key and sorts
/// the survivors newest first.
///
/// A later record replaces the kept one only when both timestamps parse and
/// the later one is strictly newer, so the first-seen record stays on ties
/// and parse failures. Unparseable timestamps sort as the oldest; the sort is
/// stable.
pub fn dedup_latest(measurements: &[Measurement]) -> Vec<Measurement> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<(Measurement, Option<DateTime<Utc>>)> = Vec::new();

    for m in measurements {
        let instant = m.measured_instant();
        match slots.get(&m.station_key()) {
            Some(&slot) => {
                let newer = match (instant, kept[slot].1) {
                    (Some(candidate), Some(existing)) => candidate > existing,
                    _ => false,
                };
                if newer {
                    kept[slot] = (m.clone(), instant);
                }
            }
            None => {
                slots.insert(m.station_key(), kept.len());
                kept.push((m.clone(), instant));
            }
        }
    }

    kept.sort_by(|a, b| b.1.cmp(&a.1));
    kept.into_iter().map(|(m, _)| m).collect()
}

/// First PM2.5 reading, else the first reading, else nothing.
pub fn primary_index(sorted: &[Measurement]) -> Option<usize> {
    sorted
        .iter()
        .position(Measurement::is_fine_particulate)
        .or_else(|| (!sorted.is_empty()).then_some(0))
}

pub fn select_latest(measurements: &[Measurement]) -> Selection {
    let latest = dedup_latest(measurements);
    let primary = primary_index(&latest);
    Selection { latest, primary }
}
