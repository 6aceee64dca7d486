//! Integration tests for the JSON entry points

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use vitals_resample::types::{MetricType, Sample, ZoneBounds, ZoneSet};
use vitals_resample::{
    daily_heart_rate_to_json, intraday_to_json, ComputeError, IntervalNormalizer, ZoneClassifier,
};

fn zones_json() -> Value {
    json!({
        "out_of_range": { "min": 30, "max": 91 },
        "fat_burn": { "min": 91, "max": 127 },
        "cardio": { "min": 127, "max": 154 },
        "peak": { "min": 154, "max": 220 }
    })
}

fn zones() -> ZoneSet {
    ZoneSet {
        out_of_range: ZoneBounds::new(30, 91),
        fat_burn: ZoneBounds::new(91, 127),
        cardio: ZoneBounds::new(127, 154),
        peak: ZoneBounds::new(154, 220),
    }
}

fn run_intraday(request: Value) -> Value {
    let output = intraday_to_json(request.to_string()).unwrap();
    serde_json::from_str(&output).unwrap()
}

/// One heart-rate sample per second of 2019-07-01, cycling through 30..=200
fn per_second_heart_rate() -> Vec<Sample> {
    let start = Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap();
    (0..86_400)
        .map(|i| Sample::new(start + Duration::seconds(i), (30 + i % 171) as f64))
        .collect()
}

#[test]
fn test_empty_day_yields_1440_zero_buckets() {
    let payload = run_intraday(json!({
        "metric": "steps",
        "date": "2019-07-01",
        "start_time": "00:00:00",
        "end_time": "23:59:59",
        "interval": "1m",
        "samples": []
    }));

    let data_set = payload["data_set"].as_array().unwrap();
    assert_eq!(data_set.len(), 1440);
    assert!(data_set.iter().all(|point| point["value"] == 0));
    assert_eq!(data_set[0]["time"], "00:00:00");
    assert_eq!(data_set[1439]["time"], "23:59:00");
    assert_eq!(payload["summary"], json!({ "total": 0 }));
}

#[test]
fn test_per_second_heart_rate_rebinned_to_minutes() {
    let samples = per_second_heart_rate();
    let payload = run_intraday(json!({
        "metric": "heart_rate",
        "date": "2019-07-01",
        "start_time": "00:00:00",
        "end_time": "23:59:59",
        "interval": "1m",
        "samples": samples,
        "zones": zones_json()
    }));

    let data_set = payload["data_set"].as_array().unwrap();
    assert_eq!(data_set.len(), 1440);

    for (minute, point) in data_set.iter().enumerate() {
        let chunk = &samples[minute * 60..(minute + 1) * 60];
        let sum: i64 = chunk.iter().map(|s| s.value as i64).sum();
        // Half-up rounding of sum / 60 on non-negative integers
        let expected = (sum + 30) / 60;
        assert_eq!(point["value"], expected, "minute {minute}");
    }

    let summary = &payload["summary"];
    assert_eq!(summary["min"], 30);
    assert_eq!(summary["max"], 200);
    assert_eq!(summary["interval"], "1m");
    assert_eq!(summary["start_time"], "00:00:00");
    assert_eq!(summary["end_time"], "23:59:59");
}

#[test]
fn test_steps_total_matches_sample_sum() {
    let start = Utc.with_ymd_and_hms(2019, 7, 1, 6, 0, 0).unwrap();
    let samples: Vec<Sample> = (0..180)
        .map(|m| Sample::new(start + Duration::minutes(m), (m % 7) as f64))
        .collect();
    let expected: i64 = (0..180).map(|m| m % 7).sum();

    let payload = run_intraday(json!({
        "metric": "steps",
        "date": "2019-07-01",
        "interval": "15m",
        "samples": samples
    }));

    assert_eq!(payload["summary"]["total"], expected);
    let bucket_sum: i64 = payload["data_set"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["value"].as_i64().unwrap())
        .sum();
    assert_eq!(bucket_sum, expected);
}

#[test]
fn test_boundary_sample_lands_in_fat_burn() {
    let payload = run_intraday(json!({
        "metric": "heart_rate",
        "date": "2019-07-01",
        "start_time": "12:00",
        "end_time": "12:00",
        "interval": "1m",
        "samples": [{ "timestamp": "2019-07-01T12:00:00Z", "value": 91 }],
        "zones": zones_json()
    }));

    let zones = &payload["summary"]["zones"];
    assert_eq!(zones["fat_burn"]["duration"], 60_000);
    assert_eq!(zones["out_of_range"]["duration"], 0);
}

#[test]
fn test_single_day_matches_classifier() {
    let samples = per_second_heart_rate();
    let calories = vec![
        Sample::new(Utc.with_ymd_and_hms(2019, 7, 1, 8, 0, 0).unwrap(), 3.25),
        Sample::new(Utc.with_ymd_and_hms(2019, 7, 1, 20, 0, 10).unwrap(), 1.5),
    ];

    let request = json!({
        "start_date": "2019-07-01",
        "end_date": "2019-07-01",
        "samples": samples,
        "calories": calories,
        "zones": {
            "defaults": [{ "recorded_at": "2019-06-01T00:00:00Z", "zones": zones_json() }]
        }
    });
    let output = daily_heart_rate_to_json(request.to_string()).unwrap();
    let payload: Value = serde_json::from_str(&output).unwrap();

    let data_set = payload["data_set"].as_array().unwrap();
    assert_eq!(data_set.len(), 1);
    assert_eq!(data_set[0]["date"], "2019-07-01");

    let expected = ZoneClassifier::new(&zones()).accumulate(&samples, &calories);
    assert_eq!(data_set[0]["zones"], serde_json::to_value(expected.zones).unwrap());
    assert_eq!(
        payload["summary"]["fat_burn_total"],
        expected.zones.fat_burn.duration_millis
    );
}

#[test]
fn test_daily_range_emits_every_day() {
    let request = json!({
        "start_date": "2019-07-01",
        "end_date": "2019-07-07",
        "samples": [
            { "timestamp": "2019-07-03T10:00:00Z", "value": 140 }
        ],
        "zones": {
            "defaults": [{ "recorded_at": "2019-06-01T00:00:00Z", "zones": zones_json() }]
        }
    });
    let output = daily_heart_rate_to_json(request.to_string()).unwrap();
    let payload: Value = serde_json::from_str(&output).unwrap();

    let dates: Vec<&str> = payload["data_set"]
        .as_array()
        .unwrap()
        .iter()
        .map(|day| day["date"].as_str().unwrap())
        .collect();
    assert_eq!(
        dates,
        vec![
            "2019-07-01",
            "2019-07-02",
            "2019-07-03",
            "2019-07-04",
            "2019-07-05",
            "2019-07-06",
            "2019-07-07"
        ]
    );
    assert_eq!(payload["summary"]["cardio_total"], 60_000);
    assert_eq!(payload["data_set"][2]["zones"]["cardio"]["duration"], 60_000);
}

#[test]
fn test_interval_tokens() {
    for token in ["30M", "0h", "1sec", "7d"] {
        assert!(
            matches!(
                IntervalNormalizer::normalize(token, MetricType::Steps),
                Err(ComputeError::InvalidInterval(_))
            ),
            "{token} should be rejected"
        );
    }

    assert_eq!(
        IntervalNormalizer::normalize("10h", MetricType::Steps)
            .unwrap()
            .to_string(),
        "600m"
    );
    assert_eq!(
        IntervalNormalizer::normalize("15s", MetricType::HeartRate)
            .unwrap()
            .to_string(),
        "15s"
    );
    assert_eq!(
        IntervalNormalizer::normalize("1m", MetricType::Distance)
            .unwrap()
            .to_string(),
        "1m"
    );
}

#[test]
fn test_heart_rate_request_without_zones_is_rejected() {
    let request = json!({
        "metric": "heart_rate",
        "date": "2019-07-01",
        "interval": "1m",
        "samples": [{ "timestamp": "2019-07-01T12:00:00Z", "value": 80 }]
    });

    assert!(matches!(
        intraday_to_json(request.to_string()),
        Err(ComputeError::MissingZoneDefinition(_))
    ));
}

#[test]
fn test_last_representable_day_is_an_error() {
    let request = json!({
        "start_date": "+262142-12-31",
        "end_date": "+262142-12-31",
        "zones": {
            "defaults": [{ "recorded_at": "2019-06-01T00:00:00Z", "zones": zones_json() }]
        }
    });

    assert!(matches!(
        daily_heart_rate_to_json(request.to_string()),
        Err(ComputeError::DateParseError(_))
    ));
}

#[test]
fn test_long_interval_on_last_representable_day() {
    let payload = run_intraday(json!({
        "metric": "steps",
        "date": "+262142-12-31",
        "interval": "1000h",
        "samples": []
    }));

    let data_set = payload["data_set"].as_array().unwrap();
    assert_eq!(data_set.len(), 1);
    assert_eq!(data_set[0]["time"], "00:00:00");
    assert_eq!(payload["summary"]["total"], 0);
}
