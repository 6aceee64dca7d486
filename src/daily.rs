//! Day-granularity heart-rate aggregation
//!
//! Walks a date range day by day (both endpoints inclusive), classifies each
//! day's samples into zones, and sums per-zone durations across the range.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ComputeError;
use crate::resampler::{Granularity, StridePartition};
use crate::synthesizer::DefaultSeriesSynthesizer;
use crate::types::{DailyHeartRateRecord, DailySeries, Sample, Window, ZoneGrandTotals, ZoneSet};
use crate::zones::{CalorieIndex, ZoneClassifier, ZONE_SAMPLE_DURATION_MILLIS};

/// A default zone set and when it was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultZones {
    pub recorded_at: DateTime<Utc>,
    pub zones: ZoneSet,
}

/// Zone boundaries over a date range: day-specific sets plus defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSchedule {
    #[serde(default)]
    pub defaults: Vec<DefaultZones>,
    #[serde(default)]
    pub daily: BTreeMap<NaiveDate, ZoneSet>,
}

impl ZoneSchedule {
    /// Schedule that applies one zone set to every day
    pub fn uniform(zones: ZoneSet) -> Self {
        Self {
            defaults: vec![DefaultZones {
                recorded_at: DateTime::<Utc>::MIN_UTC,
                zones,
            }],
            daily: BTreeMap::new(),
        }
    }

    /// Zone set for `day`, falling back to the most recently recorded default
    pub fn for_day(&self, day: NaiveDate) -> Result<&ZoneSet, ComputeError> {
        if let Some(zones) = self.daily.get(&day) {
            return Ok(zones);
        }
        self.defaults
            .iter()
            .max_by_key(|d| d.recorded_at)
            .map(|d| &d.zones)
            .ok_or_else(|| ComputeError::MissingZoneDefinition(day.to_string()))
    }
}

/// Aggregator producing one zone record per calendar day
#[derive(Debug, Clone, Copy)]
pub struct DailyHeartRateAggregator {
    sample_duration_millis: i64,
}

impl Default for DailyHeartRateAggregator {
    fn default() -> Self {
        Self::new(ZONE_SAMPLE_DURATION_MILLIS)
    }
}

impl DailyHeartRateAggregator {
    pub fn new(sample_duration_millis: i64) -> Self {
        Self {
            sample_duration_millis,
        }
    }

    /// Aggregate ascending heart-rate samples over `[start_date, end_date]`
    pub fn aggregate(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        heart_rate: &[Sample],
        calories: &[Sample],
        schedule: &ZoneSchedule,
    ) -> Result<DailySeries, ComputeError> {
        let window = Window::whole_days(start_date, end_date)?;
        window.ensure_non_empty()?;

        let in_range = &heart_rate[heart_rate.partition_point(|s| s.timestamp < window.start)..];
        let calorie_index = CalorieIndex::new(calories);

        let mut days = Vec::new();
        let mut totals = ZoneGrandTotals::default();

        for stride in StridePartition::new(in_range, &window, Granularity::Day, false) {
            let date = stride.start.date_naive();
            let zone_set = schedule.for_day(date)?;

            let zones = if stride.samples.is_empty() {
                DefaultSeriesSynthesizer::empty_zones(zone_set)
            } else {
                ZoneClassifier::with_sample_duration(zone_set, self.sample_duration_millis)
                    .accumulate_indexed(stride.samples, &calorie_index)
                    .zones
            };

            totals.add_day(&zones);
            days.push(DailyHeartRateRecord { date, zones });
        }

        debug!(
            %start_date,
            %end_date,
            days = days.len(),
            "aggregated daily heart-rate zones"
        );

        Ok(DailySeries {
            start_date,
            end_date,
            days,
            totals,
        })
    }
}
