//! Pipeline orchestration
//!
//! This module provides the public API for the engine. It takes a request
//! whose samples were already fetched, and runs it through interval
//! normalization, resampling (or zero-fill synthesis), zone classification,
//! and encoding.

use tracing::debug;

use crate::config::EngineConfig;
use crate::daily::DailyHeartRateAggregator;
use crate::encoder::SeriesEncoder;
use crate::error::ComputeError;
use crate::interval::IntervalNormalizer;
use crate::resampler::BucketResampler;
use crate::schema::{DailyHeartRateRequest, IntradayRequest};
use crate::synthesizer::DefaultSeriesSynthesizer;
use crate::types::{
    round_half_up, AggregatedValue, AggregationResult, Bucket, DailySeries, HeartRateSummary,
    Sample, SeriesSummary, ValueKind,
};
use crate::zones::ZoneClassifier;

/// Resample an intraday request JSON and return the intraday payload JSON.
///
/// # Example
/// ```ignore
/// let payload = intraday_to_json(request_json)?;
/// ```
pub fn intraday_to_json(request_json: String) -> Result<String, ComputeError> {
    SeriesProcessor::new().intraday_json(&request_json)
}

/// Aggregate a daily heart-rate request JSON and return the daily payload JSON.
///
/// # Example
/// ```ignore
/// let payload = daily_heart_rate_to_json(request_json)?;
/// ```
pub fn daily_heart_rate_to_json(request_json: String) -> Result<String, ComputeError> {
    SeriesProcessor::new().daily_heart_rate_json(&request_json)
}

/// Processor holding engine configuration and an encoder.
///
/// Every call is independent; nothing is carried between requests.
#[derive(Debug, Clone, Default)]
pub struct SeriesProcessor {
    config: EngineConfig,
    encoder: SeriesEncoder,
}

impl SeriesProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with explicit configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            encoder: SeriesEncoder::new(),
        }
    }

    /// Emit indented JSON from the `*_json` methods
    pub fn pretty(mut self) -> Self {
        self.encoder = SeriesEncoder::pretty();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resample one intraday request.
    ///
    /// Stages:
    /// 1. IntervalNormalizer - canonicalize the interval token
    /// 2. DefaultSeriesSynthesizer - when no samples fall in the window
    /// 3. BucketResampler - aggregate samples into interval buckets
    /// 4. ZoneClassifier - heart-rate zone totals
    pub fn intraday(&self, request: &IntradayRequest) -> Result<AggregationResult, ComputeError> {
        request.validate()?;

        let metric = request.metric;
        let interval = IntervalNormalizer::normalize(&request.interval, metric)?;
        let window = request.window()?;
        window.ensure_non_empty()?;

        let samples = window.slice(&request.samples);
        debug!(
            metric = %metric,
            %interval,
            samples = samples.len(),
            "resampling intraday window"
        );

        if samples.is_empty() {
            return DefaultSeriesSynthesizer::empty_result(
                metric,
                &window,
                interval,
                request.zones.as_ref(),
            );
        }

        let buckets = BucketResampler::new(self.config.trailing_gap).resample(
            samples,
            &window,
            interval,
            metric.combinator(),
            metric.value_kind(),
        )?;

        let summary = if metric.is_heart_rate() {
            let zones = request
                .zones
                .as_ref()
                .ok_or_else(|| ComputeError::MissingZoneDefinition(window.start.to_rfc3339()))?;
            let classification =
                ZoneClassifier::with_sample_duration(zones, self.config.zone_duration_millis)
                    .accumulate(samples, window.slice(&request.calories));
            let (min, max, average) = heart_rate_stats(samples);

            SeriesSummary::HeartRate(HeartRateSummary {
                min,
                max,
                average,
                zones: classification.zones,
            })
        } else {
            SeriesSummary::Total(running_total(&buckets, metric.value_kind()))
        };

        Ok(AggregationResult {
            metric,
            window,
            interval,
            buckets,
            summary,
        })
    }

    /// Aggregate one multi-day heart-rate request
    pub fn daily_heart_rate(
        &self,
        request: &DailyHeartRateRequest,
    ) -> Result<DailySeries, ComputeError> {
        request.validate()?;

        DailyHeartRateAggregator::new(self.config.zone_duration_millis).aggregate(
            request.start_date,
            request.end_date,
            &request.samples,
            &request.calories,
            &request.zones,
        )
    }

    /// Parse, resample, and encode an intraday request
    pub fn intraday_json(&self, request_json: &str) -> Result<String, ComputeError> {
        let request: IntradayRequest = serde_json::from_str(request_json)?;
        let result = self.intraday(&request)?;
        self.encoder.intraday_to_json(&result)
    }

    /// Parse, aggregate, and encode a daily heart-rate request
    pub fn daily_heart_rate_json(&self, request_json: &str) -> Result<String, ComputeError> {
        let request: DailyHeartRateRequest = serde_json::from_str(request_json)?;
        let series = self.daily_heart_rate(&request)?;
        self.encoder.daily_to_json(&series)
    }
}

/// Sum of bucket values, which equals the sum of consumed samples
fn running_total(buckets: &[Bucket], kind: ValueKind) -> AggregatedValue {
    buckets
        .iter()
        .fold(AggregatedValue::zero(kind), |acc, b| acc.add(b.value))
}

/// `(min, max, rounded average)` of raw heart-rate samples, zeros when empty
fn heart_rate_stats(samples: &[Sample]) -> (i64, i64, i64) {
    if samples.is_empty() {
        return (0, 0, 0);
    }
    let (min, max, sum) = samples.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), s| (min.min(s.value), max.max(s.value), sum + s.value),
    );
    (
        round_half_up(min),
        round_half_up(max),
        round_half_up(sum / samples.len() as f64),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampler::TrailingGap;
    use crate::types::{MetricType, ZoneBounds, ZoneSet};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn zones() -> ZoneSet {
        ZoneSet {
            out_of_range: ZoneBounds::new(30, 91),
            fat_burn: ZoneBounds::new(91, 127),
            cardio: ZoneBounds::new(127, 154),
            peak: ZoneBounds::new(154, 220),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 7, 1, h, m, 0).unwrap()
    }

    fn request(metric: MetricType, interval: &str, samples: Vec<Sample>) -> IntradayRequest {
        IntradayRequest {
            schema_version: None,
            metric,
            date: NaiveDate::from_ymd_opt(2019, 7, 1).unwrap(),
            end_date: None,
            start_time: None,
            end_time: None,
            interval: interval.to_string(),
            samples,
            calories: vec![],
            zones: None,
        }
    }

    #[test]
    fn test_empty_samples_synthesize_full_day() {
        let result = SeriesProcessor::new()
            .intraday(&request(MetricType::Steps, "1m", vec![]))
            .unwrap();

        assert_eq!(result.buckets.len(), 1440);
        assert_eq!(result.summary, SeriesSummary::Total(AggregatedValue::Integer(0)));
    }

    #[test]
    fn test_steps_total() {
        let samples = (0..120)
            .map(|m| Sample::new(at(8, 0) + Duration::minutes(m), 10.0))
            .collect();
        let mut req = request(MetricType::Steps, "1h", samples);
        req.start_time = Some("08:00".to_string());
        req.end_time = Some("09:59".to_string());

        let result = SeriesProcessor::new().intraday(&req).unwrap();

        assert_eq!(result.buckets.len(), 2);
        assert_eq!(result.summary, SeriesSummary::Total(AggregatedValue::Integer(1200)));
    }

    #[test]
    fn test_heart_rate_summary_and_zones() {
        let samples = vec![
            Sample::new(at(8, 0), 85.0),
            Sample::new(at(8, 1), 100.0),
            Sample::new(at(8, 2), 150.0),
            Sample::new(at(8, 3), 230.0),
        ];
        let mut req = request(MetricType::HeartRate, "1m", samples);
        req.start_time = Some("08:00".to_string());
        req.end_time = Some("08:03".to_string());
        req.calories = vec![Sample::new(at(8, 2), 6.5)];
        req.zones = Some(zones());

        let result = SeriesProcessor::new().intraday(&req).unwrap();
        let SeriesSummary::HeartRate(summary) = result.summary else {
            panic!("expected heart-rate summary");
        };

        assert_eq!(summary.min, 85);
        assert_eq!(summary.max, 230);
        // (85 + 100 + 150 + 230) / 4 = 141.25
        assert_eq!(summary.average, 141);
        assert_eq!(summary.zones.cardio.calories, 6.5);
        assert_eq!(summary.zones.total_duration_millis(), 3 * 60_000);
        assert_eq!(result.buckets[3].value, AggregatedValue::Integer(230));
    }

    #[test]
    fn test_heart_rate_without_zones_fails() {
        let req = request(MetricType::HeartRate, "1m", vec![Sample::new(at(8, 0), 85.0)]);

        assert!(matches!(
            SeriesProcessor::new().intraday(&req),
            Err(ComputeError::MissingZoneDefinition(_))
        ));
    }

    #[test]
    fn test_invalid_interval_fails() {
        let req = request(MetricType::Steps, "30m", vec![]);

        assert!(matches!(
            SeriesProcessor::new().intraday(&req),
            Err(ComputeError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_reversed_window_fails() {
        let mut req = request(MetricType::Steps, "1m", vec![]);
        req.start_time = Some("10:00".to_string());
        req.end_time = Some("09:00".to_string());

        assert!(matches!(
            SeriesProcessor::new().intraday(&req),
            Err(ComputeError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_zero_fill_config() {
        let config = EngineConfig {
            trailing_gap: TrailingGap::ZeroFill,
            ..Default::default()
        };
        let req = request(MetricType::Calories, "15m", vec![Sample::new(at(0, 5), 2.5)]);

        let result = SeriesProcessor::with_config(config).intraday(&req).unwrap();

        assert_eq!(result.buckets.len(), 96);
        assert_eq!(result.summary, SeriesSummary::Total(AggregatedValue::Float(2.5)));
    }

    #[test]
    fn test_intraday_to_json() {
        let json = r#"{
            "metric": "distance",
            "date": "2019-07-01",
            "start_time": "06:00",
            "end_time": "06:29",
            "interval": "15m",
            "samples": [
                { "timestamp": "2019-07-01T06:00:00Z", "value": 0.25 },
                { "timestamp": "2019-07-01T06:20:00Z", "value": 0.5 }
            ]
        }"#;

        let output = intraday_to_json(json.to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(payload["summary"]["total"], 0.75);
        assert_eq!(payload["data_set"][0]["time"], "06:00:00");
        assert_eq!(payload["data_set"][1]["value"], 0.5);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            intraday_to_json("not valid json".to_string()),
            Err(ComputeError::JsonError(_))
        ));
    }
}
