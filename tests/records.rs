mod common;

use common::{FakeRecords, reading};
use geoinsight::records::{RecordQuery, SortKey, SortOrder, group_by_country, load_records, stats_or_default};
use geoinsight::services::records_api::AirQualityReport;
use serde_json::json;

#[tokio::test]
async fn test_load_records_backfills_missing_air_quality() {
    let mut api = FakeRecords::with_records(vec![
        json!({
            "_id": "stored",
            "country": "India",
            "metadata": {"capital": "New Delhi", "countryCode": "IN"},
            "airQuality": {"results": [{"parameter": "pm25", "value": 88, "location": "ITO"}]},
            "createdAt": "2024-01-02T00:00:00Z"
        }),
        json!({
            "_id": "missing",
            "country": "Sri Lanka",
            "metadata": {"capital": "Colombo", "countryCode": "LK"},
            "airQuality": [],
            "createdAt": "2024-01-01T00:00:00Z"
        }),
    ]);
    api.report = Some(AirQualityReport {
        measurements: vec![reading("Colombo", "pm25", 14.0, "2024-01-01T00:00:00Z")],
        fallback: false,
    });

    let entries = load_records(&api).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].air_quality[0].value, 88.0);
    assert_eq!(entries[1].air_quality[0].location_name.as_deref(), Some("Colombo"));

    let queries = api.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].city.as_deref(), Some("Colombo"));
    assert_eq!(queries[0].country.as_deref(), Some("LK"));
}

#[tokio::test]
async fn test_backfill_uses_cached_fallback_then_empty() {
    let api = FakeRecords {
        report: Some(AirQualityReport::default()),
        ..FakeRecords::with_records(vec![json!({
            "_id": "cached",
            "country": "Sri Lanka",
            "airQualityFallback": [{"parameter": "pm10", "value": 30, "location": "Colombo"}]
        })])
    };
    let entries = load_records(&api).await.unwrap();
    assert_eq!(entries[0].air_quality[0].parameter.as_deref(), Some("pm10"));

    // Proxy down: the record is still listed, without readings.
    let api = FakeRecords::with_records(vec![json!({"_id": "bare", "country": "Sri Lanka"})]);
    let entries = load_records(&api).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].air_quality.is_empty());
}

#[tokio::test]
async fn test_query_sorts_filters_and_groups() {
    let api = FakeRecords::with_records(vec![
        json!({"_id": "a", "country": "India", "airQuality": [{"value": 1}],
               "createdAt": "2024-01-01T00:00:00Z", "weather": {"temperature": 30}}),
        json!({"_id": "b", "country": "Sri Lanka", "airQuality": [{"value": 1}],
               "createdAt": "2024-01-03T00:00:00Z", "weather": {"temperature": "N/A"}}),
        json!({"_id": "c", "country": "India", "airQuality": [{"value": 1}],
               "createdAt": "2024-01-02T00:00:00Z", "weather": {"temperature": 25}}),
    ]);
    let entries = load_records(&api).await.unwrap();

    let listed = RecordQuery::default().apply(&entries);
    let ids: Vec<_> = listed.iter().map(|e| e.record.id.as_str()).collect();
    assert_eq!(ids, ["b", "c", "a"]);

    let groups = group_by_country(&listed);
    let keys: Vec<_> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys, ["India", "Sri Lanka"]);
    let india: Vec<_> = groups["India"].iter().map(|e| e.record.id.as_str()).collect();
    assert_eq!(india, ["c", "a"]);

    let by_temp = RecordQuery {
        sort: SortKey::Temperature,
        order: SortOrder::Ascending,
        ..RecordQuery::default()
    };
    let ids: Vec<_> = by_temp.apply(&entries).iter().map(|e| e.record.id.as_str()).collect();
    assert_eq!(ids, ["c", "a", "b"]);

    let india_only = RecordQuery {
        country: Some("ind".to_string()),
        ..RecordQuery::default()
    };
    assert_eq!(india_only.apply(&entries).len(), 2);
}

#[tokio::test]
async fn test_stats_default_to_zero() {
    let stats = stats_or_default(&FakeRecords::default()).await;
    assert_eq!(stats.total_records, 0);
    assert_eq!(stats.unique_countries_count, 0);
}
