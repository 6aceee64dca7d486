//! Wire encoding
//!
//! Turns aggregation results into the JSON shapes callers index into:
//! intraday `{summary, data_set: [{time, value}]}` and daily
//! `{summary: {*_total}, data_set: [{date, zones}]}`. Array order is
//! chronological and never reordered.

use crate::error::ComputeError;
use crate::types::{
    AggregationResult, DailyDataPoint, DailyPayload, DailySeries, DataPoint,
    HeartRateWireSummary, IntradayPayload, SeriesSummary, WireSummary, DATE_FORMAT, TIME_FORMAT,
};

/// Encoder for caller-facing payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesEncoder {
    pretty: bool,
}

impl SeriesEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder emitting indented JSON
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Encode an intraday aggregation into its wire payload
    pub fn encode_intraday(&self, result: &AggregationResult) -> IntradayPayload {
        // Dates only disambiguate when the window crosses midnight
        let with_date = result.window.spans_multiple_days();

        let data_set = result
            .buckets
            .iter()
            .map(|bucket| DataPoint {
                date: with_date.then(|| bucket.start.format(DATE_FORMAT).to_string()),
                time: bucket.start.format(TIME_FORMAT).to_string(),
                value: bucket.value,
            })
            .collect();

        let summary = match &result.summary {
            SeriesSummary::Total(total) => WireSummary::Total { total: *total },
            SeriesSummary::HeartRate(hr) => WireSummary::HeartRate(HeartRateWireSummary {
                start_time: result.window.start.format(TIME_FORMAT).to_string(),
                end_time: result.window.end.format(TIME_FORMAT).to_string(),
                interval: result.interval,
                min: hr.min,
                max: hr.max,
                average: hr.average,
                zones: hr.zones,
            }),
        };

        IntradayPayload { summary, data_set }
    }

    /// Encode a multi-day heart-rate series into its wire payload
    pub fn encode_daily(&self, series: &DailySeries) -> DailyPayload {
        DailyPayload {
            summary: series.totals,
            data_set: series
                .days
                .iter()
                .map(|day| DailyDataPoint {
                    date: day.date.format(DATE_FORMAT).to_string(),
                    zones: day.zones,
                })
                .collect(),
        }
    }

    /// Encode an intraday aggregation to a JSON string
    pub fn intraday_to_json(&self, result: &AggregationResult) -> Result<String, ComputeError> {
        self.to_json(&self.encode_intraday(result))
    }

    /// Encode a daily series to a JSON string
    pub fn daily_to_json(&self, series: &DailySeries) -> Result<String, ComputeError> {
        self.to_json(&self.encode_daily(series))
    }

    fn to_json<T: serde::Serialize>(&self, payload: &T) -> Result<String, ComputeError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(payload)?
        } else {
            serde_json::to_string(payload)?
        };
        Ok(json)
    }
}
