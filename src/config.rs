//! Engine configuration
//!
//! Tunables that callers may override from a JSON file. Every field has a
//! default, so `{}` is a valid config.

use serde::{Deserialize, Serialize};

use crate::resampler::TrailingGap;
use crate::zones::ZONE_SAMPLE_DURATION_MILLIS;

/// Configuration shared by every stage of a processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Handling of strides after a non-empty stream runs out
    pub trailing_gap: TrailingGap,
    /// Duration credited to a zone for each classified sample
    pub zone_duration_millis: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trailing_gap: TrailingGap::Truncate,
            zone_duration_millis: ZONE_SAMPLE_DURATION_MILLIS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
