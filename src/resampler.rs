//! Bucket resampling
//!
//! Partitions a window into contiguous strides and aggregates the ascending
//! sample stream into one bucket per stride. Samples are consumed in order,
//! never re-scanned, and never split across buckets.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ComputeError;
use crate::types::{
    round_half_up, AggregatedValue, Bucket, Combinator, IntervalSpec, Sample, ValueKind, Window,
};

/// What happens to strides after a non-empty stream runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingGap {
    /// Stop emitting buckets once every sample has been consumed
    #[default]
    Truncate,
    /// Keep emitting zero-valued buckets out to the window end
    ZeroFill,
}

/// Stride length used to walk a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Interval(IntervalSpec),
    Day,
}

impl Granularity {
    pub fn step(&self) -> Duration {
        match self {
            Granularity::Interval(spec) => spec.duration(),
            Granularity::Day => Duration::days(1),
        }
    }
}

/// Iterator over `[start, end)` strides covering a window; the last one may be short
#[derive(Debug, Clone)]
pub struct Strides {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
}

impl Strides {
    pub fn new(window: &Window, granularity: Granularity) -> Self {
        Self {
            cursor: window.start,
            end: window.end,
            step: granularity.step(),
        }
    }
}

impl Iterator for Strides {
    type Item = (DateTime<Utc>, DateTime<Utc>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end || self.step <= Duration::zero() {
            return None;
        }
        let start = self.cursor;
        let end = start
            .checked_add_signed(self.step)
            .map_or(self.end, |next| next.min(self.end));
        self.cursor = end;
        Some((start, end))
    }
}

/// One stride with the samples that fell into it
#[derive(Debug, Clone, Copy)]
pub struct StrideSlice<'a> {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub samples: &'a [Sample],
}

/// Walks strides and hands out each stride's share of an ascending sample stream.
///
/// A stride takes every unconsumed sample with `timestamp < stride end`. When
/// `inclusive_end` is set, the final stride also takes samples stamped exactly
/// at the window end.
#[derive(Debug, Clone)]
pub struct StridePartition<'a> {
    samples: &'a [Sample],
    consumed: usize,
    strides: Strides,
    window_end: DateTime<Utc>,
    inclusive_end: bool,
}

impl<'a> StridePartition<'a> {
    pub fn new(
        samples: &'a [Sample],
        window: &Window,
        granularity: Granularity,
        inclusive_end: bool,
    ) -> Self {
        Self {
            samples,
            consumed: 0,
            strides: Strides::new(window, granularity),
            window_end: window.end,
            inclusive_end,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.samples.len()
    }
}

impl<'a> Iterator for StridePartition<'a> {
    type Item = StrideSlice<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, end) = self.strides.next()?;
        let take_end = self.inclusive_end && end == self.window_end;

        let samples: &'a [Sample] = self.samples;
        let rest = &samples[self.consumed..];
        let count = rest.partition_point(|s| s.timestamp < end || (take_end && s.timestamp == end));
        self.consumed += count;

        Some(StrideSlice {
            start,
            end,
            samples: &rest[..count],
        })
    }
}

/// Combine the values of one stride
pub fn combine(samples: &[Sample], combinator: Combinator, kind: ValueKind) -> AggregatedValue {
    match combinator {
        Combinator::Sum => match kind {
            ValueKind::Integer => {
                AggregatedValue::Integer(samples.iter().map(|s| s.value.round() as i64).sum())
            }
            ValueKind::Float => AggregatedValue::Float(samples.iter().map(|s| s.value).sum()),
        },
        Combinator::RoundedAverage => {
            if samples.is_empty() {
                return AggregatedValue::zero(ValueKind::Integer);
            }
            let sum: f64 = samples.iter().map(|s| s.value).sum();
            AggregatedValue::Integer(round_half_up(sum / samples.len() as f64))
        }
    }
}

/// Resampler turning a base-resolution stream into interval buckets
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketResampler {
    trailing_gap: TrailingGap,
}

impl BucketResampler {
    pub fn new(trailing_gap: TrailingGap) -> Self {
        Self { trailing_gap }
    }

    /// Resample ascending `samples` over `window` into `interval` buckets
    pub fn resample(
        &self,
        samples: &[Sample],
        window: &Window,
        interval: IntervalSpec,
        combinator: Combinator,
        kind: ValueKind,
    ) -> Result<Vec<Bucket>, ComputeError> {
        window.ensure_non_empty()?;

        let mut partition =
            StridePartition::new(samples, window, Granularity::Interval(interval), true);
        let mut buckets = Vec::new();

        loop {
            if self.trailing_gap == TrailingGap::Truncate && partition.is_exhausted() {
                break;
            }
            let Some(stride) = partition.next() else {
                break;
            };
            buckets.push(Bucket {
                start: stride.start,
                end: stride.end,
                value: combine(stride.samples, combinator, kind),
            });
        }

        if let Some(last) = buckets.last() {
            if last.end < window.end {
                warn!(
                    window_end = %window.end,
                    last_bucket_end = %last.end,
                    "sample stream ended before window end; trailing strides not emitted"
                );
            }
        }

        Ok(buckets)
    }
}
