mod common;

use common::reading;
use geoinsight::airquality::{
    AirQualityView, Tier, classify, dedup_latest, normalize, select_latest,
};
use serde_json::json;

#[test]
fn test_array_payload_passes_through() {
    let out = normalize(&json!([{
        "parameter": "pm25",
        "value": 12,
        "measuredAt": "2024-01-01T00:00:00Z",
        "locationName": "A"
    }]));

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].parameter.as_deref(), Some("pm25"));
    assert_eq!(out[0].value, 12.0);
    assert_eq!(out[0].measured_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    assert_eq!(out[0].location_name.as_deref(), Some("A"));
}

#[test]
fn test_nested_results_are_extracted() {
    let out = normalize(&json!({"results": [{"pollutant": "no2", "avg": 5, "city": "X"}]}));

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].parameter.as_deref(), Some("no2"));
    assert_eq!(out[0].value, 5.0);
    assert_eq!(out[0].location_name.as_deref(), Some("X"));
}

#[test]
fn test_flat_pollutant_map_falls_back() {
    let out = normalize(&json!({"pm25": 18, "no2": 7, "timestamp": "2024-02-01T00:00:00Z"}));

    assert_eq!(out.len(), 2);
    let mut params: Vec<_> = out.iter().filter_map(|m| m.parameter.as_deref()).collect();
    params.sort();
    assert_eq!(params, ["no2", "pm25"]);
    for m in &out {
        assert_eq!(m.measured_at.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(m.unit.as_deref(), Some("µg/m³"));
    }
}

#[test]
fn test_records_without_value_are_dropped() {
    assert!(normalize(&json!([{"parameter": "o3"}])).is_empty());
}

#[test]
fn test_latest_reading_wins_per_station() {
    let out = dedup_latest(&[
        reading("Station1", "pm25", 10.0, "2024-01-01T00:00:00Z"),
        reading("Station1", "pm25", 20.0, "2024-01-02T00:00:00Z"),
    ]);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].measured_at.as_deref(), Some("2024-01-02T00:00:00Z"));
}

#[test]
fn test_pm25_is_primary_even_when_older() {
    let selection = select_latest(&[
        reading("S", "pm2.5", 15.0, "2024-01-01T00:00:00Z"),
        reading("S", "no2", 3.0, "2024-01-05T00:00:00Z"),
    ]);

    assert_eq!(selection.latest[0].parameter.as_deref(), Some("no2"));
    assert_eq!(selection.primary().and_then(|m| m.parameter.as_deref()), Some("pm2.5"));
}

#[test]
fn test_specific_tiers_take_precedence() {
    assert_eq!(classify(Some("Unhealthy for Sensitive Groups")), Tier::UnhealthySensitive);
    assert_eq!(classify(Some("Very Unhealthy")), Tier::VeryUnhealthy);
    assert_eq!(classify(Some("Unhealthy")), Tier::Unhealthy);
}

#[test]
fn test_unknown_status_is_safe() {
    assert_eq!(classify(None), Tier::Unknown);
    assert_eq!(classify(Some("")), Tier::Unknown);
    assert_eq!(classify(Some("Extreme Danger")), Tier::Unknown);
}

#[test]
fn test_dedup_is_idempotent() {
    let once = dedup_latest(&[
        reading("A", "pm25", 1.0, "2024-01-01T00:00:00Z"),
        reading("A", "pm25", 2.0, "2024-01-03T00:00:00Z"),
        reading("B", "no2", 3.0, "not a date"),
        reading("B", "o3", 4.0, "2024-01-02T00:00:00Z"),
    ]);
    assert_eq!(dedup_latest(&once), once);
}

#[test]
fn test_provider_payload_to_card() {
    let payload = json!({
        "data": [
            {"location": "Colombo", "parameter": "pm25", "value": 42.37,
             "unit": "µg/m³", "date": {"utc": "2024-03-01T10:00:00Z"},
             "category": "Unhealthy for Sensitive Groups"},
            {"location": "Colombo", "parameter": "pm25", "value": 12.0,
             "date": {"utc": "2024-02-28T10:00:00Z"}, "category": "Good"},
            {"location": "Colombo", "parameter": "o3", "value": 0.0412,
             "date": {"utc": "2024-03-01T11:00:00Z"}}
        ]
    });

    let AirQualityView::Reading(view) = AirQualityView::build(&normalize(&payload), false) else {
        panic!("expected a reading");
    };
    assert_eq!(view.value, "42.4");
    assert_eq!(view.parameter.as_deref(), Some("PM25"));
    assert_eq!(view.classification.tier, Tier::UnhealthySensitive);
    assert_eq!(view.readings, 2);
}
