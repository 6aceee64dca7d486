//! Core types for the resampling engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: raw samples, interval specs, buckets, zone definitions and
//! accumulators, aggregation results, and the wire payloads handed back to
//! callers.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::ComputeError;

/// Display format for time-of-day labels in intraday payloads
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Display format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Activity metric carried by a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Steps,
    Calories,
    Distance,
    ActiveMinutes,
    HeartRate,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Steps => "steps",
            MetricType::Calories => "calories",
            MetricType::Distance => "distance",
            MetricType::ActiveMinutes => "active_minutes",
            MetricType::HeartRate => "heart_rate",
        }
    }

    pub fn is_heart_rate(&self) -> bool {
        matches!(self, MetricType::HeartRate)
    }

    /// How samples inside one bucket are combined
    pub fn combinator(&self) -> Combinator {
        match self {
            MetricType::HeartRate => Combinator::RoundedAverage,
            _ => Combinator::Sum,
        }
    }

    /// Numeric representation of aggregated values
    pub fn value_kind(&self) -> ValueKind {
        match self {
            // Active minutes are stored as integer milliseconds
            MetricType::Steps | MetricType::ActiveMinutes | MetricType::HeartRate => {
                ValueKind::Integer
            }
            MetricType::Calories | MetricType::Distance => ValueKind::Float,
        }
    }

    /// Finest sampling period at which the metric is stored
    pub fn base_resolution(&self) -> IntervalSpec {
        match self {
            MetricType::HeartRate => IntervalSpec::seconds(1),
            _ => IntervalSpec::minutes(1),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-bucket combination rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Plain sum, full precision
    Sum,
    /// `round(sum / count)`, rounding half up
    RoundedAverage,
}

/// Whether a metric aggregates to integers or floats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
}

/// One raw reading at base resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Unit of a normalized interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Seconds,
    Minutes,
}

impl IntervalUnit {
    pub fn suffix(&self) -> char {
        match self {
            IntervalUnit::Seconds => 's',
            IntervalUnit::Minutes => 'm',
        }
    }

    fn seconds_per_unit(&self) -> i64 {
        match self {
            IntervalUnit::Seconds => 1,
            IntervalUnit::Minutes => 60,
        }
    }
}

/// Canonical output granularity: a positive magnitude in seconds or minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSpec {
    pub magnitude: u32,
    pub unit: IntervalUnit,
}

impl IntervalSpec {
    pub fn seconds(magnitude: u32) -> Self {
        Self {
            magnitude,
            unit: IntervalUnit::Seconds,
        }
    }

    pub fn minutes(magnitude: u32) -> Self {
        Self {
            magnitude,
            unit: IntervalUnit::Minutes,
        }
    }

    /// Stride length of one bucket
    pub fn duration(&self) -> Duration {
        Duration::seconds(i64::from(self.magnitude) * self.unit.seconds_per_unit())
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

impl Serialize for IntervalSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Aggregated value of one bucket, integer or float depending on the metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregatedValue {
    Integer(i64),
    Float(f64),
}

impl AggregatedValue {
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer => AggregatedValue::Integer(0),
            ValueKind::Float => AggregatedValue::Float(0.0),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            AggregatedValue::Integer(v) => *v as f64,
            AggregatedValue::Float(v) => *v,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            AggregatedValue::Integer(v) => *v == 0,
            AggregatedValue::Float(v) => *v == 0.0,
        }
    }

    /// Add two values of the same kind; mixed kinds widen to float
    pub fn add(self, other: AggregatedValue) -> AggregatedValue {
        match (self, other) {
            (AggregatedValue::Integer(a), AggregatedValue::Integer(b)) => {
                AggregatedValue::Integer(a + b)
            }
            (a, b) => AggregatedValue::Float(a.as_f64() + b.as_f64()),
        }
    }
}

/// Round to the nearest integer, halves go up
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// One aggregated time slice `[start, end)`
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub value: AggregatedValue,
}

/// Absolute time range `[start, end]` a request covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Compose a window from calendar dates and times of day (UTC)
    pub fn compose(
        start_date: NaiveDate,
        start_time: NaiveTime,
        end_date: NaiveDate,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            start: start_date.and_time(start_time).and_utc(),
            end: end_date.and_time(end_time).and_utc(),
        }
    }

    /// Window spanning whole calendar days, `[start_date 00:00, end_date + 1 00:00)`
    pub fn whole_days(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, ComputeError> {
        let start = start_date.and_time(NaiveTime::default()).and_utc();
        let end = end_date
            .and_time(NaiveTime::default())
            .and_utc()
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| {
                ComputeError::DateParseError(format!("{end_date} is the last representable day"))
            })?;
        Ok(Self { start, end })
    }

    pub fn ensure_non_empty(&self) -> Result<(), ComputeError> {
        if self.start >= self.end {
            return Err(ComputeError::EmptyWindow {
                start: self.start.to_rfc3339(),
                end: self.end.to_rfc3339(),
            });
        }
        Ok(())
    }

    /// Sub-slice of ascending samples falling inside the window
    pub fn slice<'a>(&self, samples: &'a [Sample]) -> &'a [Sample] {
        let from = samples.partition_point(|s| s.timestamp < self.start);
        let to = samples.partition_point(|s| s.timestamp <= self.end);
        if from >= to {
            return &[];
        }
        &samples[from..to]
    }

    pub fn spans_multiple_days(&self) -> bool {
        self.start.date_naive() != self.end.date_naive()
    }
}

/// Heart-rate zone label, in classification order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneName {
    OutOfRange,
    FatBurn,
    Cardio,
    Peak,
}

impl ZoneName {
    pub const ALL: [ZoneName; 4] = [
        ZoneName::OutOfRange,
        ZoneName::FatBurn,
        ZoneName::Cardio,
        ZoneName::Peak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneName::OutOfRange => "out_of_range",
            ZoneName::FatBurn => "fat_burn",
            ZoneName::Cardio => "cardio",
            ZoneName::Peak => "peak",
        }
    }
}

/// Bpm range of one zone, `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneBounds {
    pub min: u32,
    pub max: u32,
}

impl ZoneBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// A named zone with inclusive lower and exclusive upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneDefinition {
    pub name: ZoneName,
    pub min_bpm: u32,
    pub max_bpm: u32,
}

impl ZoneDefinition {
    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= f64::from(self.min_bpm) && bpm < f64::from(self.max_bpm)
    }
}

/// The four zone boundaries of one patient/device, keyed as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneSet {
    pub out_of_range: ZoneBounds,
    pub fat_burn: ZoneBounds,
    pub cardio: ZoneBounds,
    pub peak: ZoneBounds,
}

impl ZoneSet {
    pub fn bounds(&self, zone: ZoneName) -> ZoneBounds {
        match zone {
            ZoneName::OutOfRange => self.out_of_range,
            ZoneName::FatBurn => self.fat_burn,
            ZoneName::Cardio => self.cardio,
            ZoneName::Peak => self.peak,
        }
    }

    /// Zone definitions in classification order
    pub fn definitions(&self) -> [ZoneDefinition; 4] {
        ZoneName::ALL.map(|name| {
            let bounds = self.bounds(name);
            ZoneDefinition {
                name,
                min_bpm: bounds.min,
                max_bpm: bounds.max,
            }
        })
    }
}

/// Duration and calories accumulated in one zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneAccumulator {
    #[serde(skip)]
    pub zone: ZoneName,
    pub min: u32,
    pub max: u32,
    #[serde(rename = "duration")]
    pub duration_millis: i64,
    pub calories: f64,
}

impl ZoneAccumulator {
    pub fn empty(definition: &ZoneDefinition) -> Self {
        Self {
            zone: definition.name,
            min: definition.min_bpm,
            max: definition.max_bpm,
            duration_millis: 0,
            calories: 0.0,
        }
    }
}

/// The four zone accumulators, serialized under the fixed zone keys
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub out_of_range: ZoneAccumulator,
    pub fat_burn: ZoneAccumulator,
    pub cardio: ZoneAccumulator,
    pub peak: ZoneAccumulator,
}

impl ZoneSummary {
    /// Zero duration and calories, bounds taken from the zone set
    pub fn zeroed(zones: &ZoneSet) -> Self {
        let [out_of_range, fat_burn, cardio, peak] =
            zones.definitions().map(|def| ZoneAccumulator::empty(&def));
        Self {
            out_of_range,
            fat_burn,
            cardio,
            peak,
        }
    }

    pub fn get_mut(&mut self, zone: ZoneName) -> &mut ZoneAccumulator {
        match zone {
            ZoneName::OutOfRange => &mut self.out_of_range,
            ZoneName::FatBurn => &mut self.fat_burn,
            ZoneName::Cardio => &mut self.cardio,
            ZoneName::Peak => &mut self.peak,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneAccumulator> {
        [&self.out_of_range, &self.fat_burn, &self.cardio, &self.peak].into_iter()
    }

    pub fn total_duration_millis(&self) -> i64 {
        self.iter().map(|z| z.duration_millis).sum()
    }
}

/// Heart-rate summary statistics over the raw samples of a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartRateSummary {
    pub min: i64,
    pub max: i64,
    pub average: i64,
    pub zones: ZoneSummary,
}

/// Metric-specific summary of one aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesSummary {
    /// Running total for steps, calories, distance, and active minutes
    Total(AggregatedValue),
    HeartRate(HeartRateSummary),
}

/// Output of one intraday resampling call
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub metric: MetricType,
    pub window: Window,
    pub interval: IntervalSpec,
    pub buckets: Vec<Bucket>,
    pub summary: SeriesSummary,
}

/// Zone totals of one calendar day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyHeartRateRecord {
    pub date: NaiveDate,
    pub zones: ZoneSummary,
}

/// Zone durations summed across every day of a series (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ZoneGrandTotals {
    pub out_of_range_total: i64,
    pub fat_burn_total: i64,
    pub cardio_total: i64,
    pub peak_total: i64,
}

impl ZoneGrandTotals {
    pub fn add_day(&mut self, zones: &ZoneSummary) {
        self.out_of_range_total += zones.out_of_range.duration_millis;
        self.fat_burn_total += zones.fat_burn.duration_millis;
        self.cardio_total += zones.cardio.duration_millis;
        self.peak_total += zones.peak.duration_millis;
    }
}

/// Output of one multi-day heart-rate aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DailyHeartRateRecord>,
    pub totals: ZoneGrandTotals,
}

// Wire payloads

/// One intraday data point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    /// Calendar date, only present when the window crosses midnight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub time: String,
    pub value: AggregatedValue,
}

/// Heart-rate intraday summary as sent to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateWireSummary {
    pub start_time: String,
    pub end_time: String,
    pub interval: IntervalSpec,
    pub min: i64,
    pub max: i64,
    pub average: i64,
    pub zones: ZoneSummary,
}

/// Intraday summary: running total or heart-rate statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireSummary {
    Total { total: AggregatedValue },
    HeartRate(HeartRateWireSummary),
}

/// Intraday response payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntradayPayload {
    pub summary: WireSummary,
    pub data_set: Vec<DataPoint>,
}

/// One day of the multi-day heart-rate series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDataPoint {
    pub date: String,
    pub zones: ZoneSummary,
}

/// Multi-day heart-rate response payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPayload {
    pub summary: ZoneGrandTotals,
    pub data_set: Vec<DailyDataPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interval_display_and_duration() {
        assert_eq!(IntervalSpec::minutes(15).to_string(), "15m");
        assert_eq!(IntervalSpec::seconds(1).to_string(), "1s");
        assert_eq!(IntervalSpec::minutes(600).duration(), Duration::hours(10));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(72.5), 73);
        assert_eq!(round_half_up(72.49), 72);
        assert_eq!(round_half_up(0.0), 0);
    }

    #[test]
    fn test_window_slice() {
        let at = |m| Utc.with_ymd_and_hms(2019, 7, 1, 0, m, 0).unwrap();
        let samples: Vec<Sample> = (0..10).map(|m| Sample::new(at(m), m as f64)).collect();
        let window = Window::new(at(2), at(5));

        let slice = window.slice(&samples);
        assert_eq!(slice.len(), 4);
        assert_eq!(slice[0].value, 2.0);
        assert_eq!(slice[3].value, 5.0);
    }

    #[test]
    fn test_empty_window_rejected() {
        let at = Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            Window::new(at, at).ensure_non_empty(),
            Err(ComputeError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_whole_days_range() {
        let window = Window::whole_days(
            NaiveDate::from_ymd_opt(2019, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 7, 2).unwrap(),
        )
        .unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2019, 7, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_whole_days_last_representable_day() {
        assert!(matches!(
            Window::whole_days(NaiveDate::MAX, NaiveDate::MAX),
            Err(ComputeError::DateParseError(_))
        ));
    }

    #[test]
    fn test_zone_summary_serializes_fixed_keys() {
        let zones = ZoneSet {
            out_of_range: ZoneBounds::new(30, 91),
            fat_burn: ZoneBounds::new(91, 127),
            cardio: ZoneBounds::new(127, 154),
            peak: ZoneBounds::new(154, 220),
        };
        let json = serde_json::to_value(ZoneSummary::zeroed(&zones)).unwrap();

        assert_eq!(json["out_of_range"]["min"], 30);
        assert_eq!(json["peak"]["max"], 220);
        assert_eq!(json["cardio"]["duration"], 0);
        assert_eq!(json["fat_burn"]["calories"], 0.0);
        assert!(json["fat_burn"].get("zone").is_none());
    }
}
