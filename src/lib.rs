//! Vitals Resample - resampling and heart-rate zone engine for activity time series
//!
//! Takes already-fetched raw samples (steps, calories, distance, active minutes,
//! heart rate) at base resolution and re-bins them to a coarser interval through
//! a deterministic pipeline: interval normalization → bucket resampling (or
//! zero-fill synthesis) → zone classification → wire encoding.
//!
//! ## Modules
//!
//! - **Intraday**: one metric over a window, bucketed by `1s`/`15s`/`1m`/`15m`/`Nh`
//! - **Daily heart rate**: one zone record per calendar day over a date range

pub mod config;
pub mod daily;
pub mod encoder;
pub mod error;
pub mod interval;
pub mod pipeline;
pub mod resampler;
pub mod schema;
pub mod synthesizer;
pub mod types;
pub mod zones;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use daily::{DailyHeartRateAggregator, DefaultZones, ZoneSchedule};
pub use encoder::SeriesEncoder;
pub use error::ComputeError;
pub use interval::IntervalNormalizer;
pub use pipeline::{daily_heart_rate_to_json, intraday_to_json, SeriesProcessor};
pub use resampler::{BucketResampler, Granularity, TrailingGap};
pub use synthesizer::DefaultSeriesSynthesizer;
pub use zones::{CalorieIndex, ZoneClassifier};

// Schema exports
pub use schema::{DailyHeartRateRequest, IntradayRequest, SCHEMA_VERSION};

/// Engine version embedded in diagnostics
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by diagnostics
pub const PRODUCER_NAME: &str = "vitals-resample";
