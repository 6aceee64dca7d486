//! Zero-filled series synthesis
//!
//! Used when storage returned no samples for a window: produces the same
//! stride layout the resampler would, with every value (and every zone
//! duration/calorie figure) at zero, so callers always get a complete shape.

use tracing::debug;

use crate::error::ComputeError;
use crate::resampler::{Granularity, Strides};
use crate::types::{
    AggregatedValue, AggregationResult, Bucket, HeartRateSummary, IntervalSpec, MetricType,
    SeriesSummary, ValueKind, Window, ZoneSet, ZoneSummary,
};

/// Synthesizer for empty windows
pub struct DefaultSeriesSynthesizer;

impl DefaultSeriesSynthesizer {
    /// One zero-valued bucket per stride of `window`
    pub fn empty_buckets(
        window: &Window,
        granularity: Granularity,
        kind: ValueKind,
    ) -> Result<Vec<Bucket>, ComputeError> {
        window.ensure_non_empty()?;

        Ok(Strides::new(window, granularity)
            .map(|(start, end)| Bucket {
                start,
                end,
                value: AggregatedValue::zero(kind),
            })
            .collect())
    }

    /// Zone accumulators with the given bounds and nothing accumulated
    pub fn empty_zones(zones: &ZoneSet) -> ZoneSummary {
        ZoneSummary::zeroed(zones)
    }

    /// Complete zero-valued aggregation result for `metric`.
    ///
    /// Heart rate without zone boundaries falls back to zero-initialized zones.
    pub fn empty_result(
        metric: MetricType,
        window: &Window,
        interval: IntervalSpec,
        zones: Option<&ZoneSet>,
    ) -> Result<AggregationResult, ComputeError> {
        let kind = metric.value_kind();
        let buckets = Self::empty_buckets(window, Granularity::Interval(interval), kind)?;

        debug!(
            metric = %metric,
            buckets = buckets.len(),
            "no samples for window, synthesized zero series"
        );

        let summary = if metric.is_heart_rate() {
            let zones = zones.copied().unwrap_or_default();
            SeriesSummary::HeartRate(HeartRateSummary {
                min: 0,
                max: 0,
                average: 0,
                zones: Self::empty_zones(&zones),
            })
        } else {
            SeriesSummary::Total(AggregatedValue::zero(kind))
        };

        Ok(AggregationResult {
            metric,
            window: *window,
            interval,
            buckets,
            summary,
        })
    }
}
