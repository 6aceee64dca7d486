//! Heart-rate zone classification
//!
//! Assigns each heart-rate sample to the first zone whose `[min, max)` range
//! contains it and accumulates a fixed duration plus the coincident calorie
//! sample into that zone. Samples outside every zone contribute nothing.

use std::collections::HashMap;

use tracing::warn;

use crate::types::{Sample, ZoneDefinition, ZoneName, ZoneSet, ZoneSummary};

/// Duration credited to a zone per classified sample (one minute)
pub const ZONE_SAMPLE_DURATION_MILLIS: i64 = 60_000;

/// Calorie samples keyed by their timestamp in milliseconds
#[derive(Debug, Clone, Default)]
pub struct CalorieIndex {
    by_millis: HashMap<i64, f64>,
}

impl CalorieIndex {
    pub fn new(calories: &[Sample]) -> Self {
        let mut by_millis = HashMap::with_capacity(calories.len());
        for sample in calories {
            // First match wins on duplicate timestamps
            by_millis
                .entry(sample.timestamp.timestamp_millis())
                .or_insert(sample.value);
        }
        Self { by_millis }
    }

    /// Calories recorded at exactly this instant, 0 when absent
    pub fn at(&self, sample: &Sample) -> f64 {
        self.by_millis
            .get(&sample.timestamp.timestamp_millis())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Zone totals from one classification pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClassification {
    pub zones: ZoneSummary,
    /// Samples below the lowest min or at/above the highest max
    pub unclassified: usize,
}

/// Classifier over one fixed zone set
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    zones: ZoneSet,
    definitions: [ZoneDefinition; 4],
    sample_duration_millis: i64,
}

impl ZoneClassifier {
    pub fn new(zones: &ZoneSet) -> Self {
        Self::with_sample_duration(zones, ZONE_SAMPLE_DURATION_MILLIS)
    }

    pub fn with_sample_duration(zones: &ZoneSet, sample_duration_millis: i64) -> Self {
        Self {
            zones: *zones,
            definitions: zones.definitions(),
            sample_duration_millis,
        }
    }

    /// Zone containing `bpm`, evaluated out_of_range → fat_burn → cardio → peak
    pub fn classify(&self, bpm: f64) -> Option<ZoneName> {
        self.definitions
            .iter()
            .find(|def| def.contains(bpm))
            .map(|def| def.name)
    }

    /// Classify heart-rate samples, matching calories by exact timestamp
    pub fn accumulate(&self, heart_rate: &[Sample], calories: &[Sample]) -> ZoneClassification {
        self.accumulate_indexed(heart_rate, &CalorieIndex::new(calories))
    }

    /// Classify heart-rate samples against a prebuilt calorie index
    pub fn accumulate_indexed(
        &self,
        heart_rate: &[Sample],
        calories: &CalorieIndex,
    ) -> ZoneClassification {
        let mut zones = ZoneSummary::zeroed(&self.zones);
        let mut unclassified = 0;

        for sample in heart_rate {
            match self.classify(sample.value) {
                Some(name) => {
                    let acc = zones.get_mut(name);
                    acc.duration_millis += self.sample_duration_millis;
                    acc.calories += calories.at(sample);
                }
                None => unclassified += 1,
            }
        }

        if unclassified > 0 {
            warn!(
                unclassified,
                lowest_min = self.zones.out_of_range.min,
                highest_max = self.zones.peak.max,
                "heart-rate samples outside every zone were left out of zone totals"
            );
        }

        ZoneClassification {
            zones,
            unclassified,
        }
    }
}
