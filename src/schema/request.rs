//! Request definitions and window composition

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::daily::ZoneSchedule;
use crate::error::ComputeError;
use crate::types::{MetricType, Sample, Window, ZoneSet};

/// Current request schema version
pub const SCHEMA_VERSION: &str = "vitals.series_request.v1";

/// Default start of an intraday window
pub const DEFAULT_START_TIME: &str = "00:00";

/// Default end of an intraday window (inclusive of the whole minute)
pub const DEFAULT_END_TIME: &str = "23:59";

/// Request to resample one metric over an intraday window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntradayRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub metric: MetricType,
    /// First calendar day of the window
    pub date: NaiveDate,
    /// Last calendar day of the window, defaults to `date`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// `HH:mm` or `HH:mm:ss`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// `HH:mm` (whole minute) or `HH:mm:ss`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Interval token such as `1m`, `15s`, or `1h`
    pub interval: String,
    /// Raw samples in ascending timestamp order
    #[serde(default)]
    pub samples: Vec<Sample>,
    /// Calorie samples aligned with heart-rate samples
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calories: Vec<Sample>,
    /// Heart-rate zone boundaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<ZoneSet>,
}

impl IntradayRequest {
    /// Absolute window composed from dates and times of day
    pub fn window(&self) -> Result<Window, ComputeError> {
        let start_time = parse_time_of_day(
            self.start_time.as_deref().unwrap_or(DEFAULT_START_TIME),
            false,
        )?;
        let end_time =
            parse_time_of_day(self.end_time.as_deref().unwrap_or(DEFAULT_END_TIME), true)?;

        Ok(Window::compose(
            self.date,
            start_time,
            self.end_date.unwrap_or(self.date),
            end_time,
        ))
    }

    /// Structural checks the engine itself does not make
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_schema_version(self.schema_version.as_deref())?;

        if !self.metric.is_heart_rate() && !self.calories.is_empty() {
            return Err(ValidationError::UnexpectedCalories {
                metric: self.metric.to_string(),
            });
        }

        check_ascending("samples", &self.samples)?;
        check_ascending("calories", &self.calories)
    }
}

/// Request for one zone record per day over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyHeartRateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub calories: Vec<Sample>,
    pub zones: ZoneSchedule,
}

impl DailyHeartRateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_schema_version(self.schema_version.as_deref())?;
        check_ascending("samples", &self.samples)
    }
}

/// Parse `HH:mm` or `HH:mm:ss`.
///
/// An `HH:mm` end time covers the whole minute, so `23:59` ends at `23:59:59`.
pub fn parse_time_of_day(value: &str, is_end: bool) -> Result<NaiveTime, ComputeError> {
    if let Ok(time) = NaiveTime::parse_from_str(value, "%H:%M:%S") {
        return Ok(time);
    }

    let time = NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| ComputeError::DateParseError(format!("{value}: {e}")))?;

    if is_end {
        NaiveTime::from_hms_opt(time.hour(), time.minute(), 59)
            .ok_or_else(|| ComputeError::DateParseError(value.to_string()))
    } else {
        Ok(time)
    }
}

fn check_schema_version(version: Option<&str>) -> Result<(), ValidationError> {
    match version {
        Some(actual) if actual != SCHEMA_VERSION => Err(ValidationError::InvalidSchemaVersion {
            expected: SCHEMA_VERSION.to_string(),
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

fn check_ascending(field: &'static str, samples: &[Sample]) -> Result<(), ValidationError> {
    match samples
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        Some(index) => Err(ValidationError::UnsortedSamples {
            field,
            index: index + 1,
        }),
        None => Ok(()),
    }
}

/// Validation errors for series requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Calorie samples are only accepted for heart_rate, not {metric}")]
    UnexpectedCalories { metric: String },

    #[error("{field} must be in ascending timestamp order (first violation at index {index})")]
    UnsortedSamples { field: &'static str, index: usize },
}
