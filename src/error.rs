//! Error types for the resampling engine

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors that can occur during resampling and zone classification
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Empty window: start {start} is not before end {end}")]
    EmptyWindow { start: String, end: String },

    #[error("No zone definition available for {0}")]
    MissingZoneDefinition(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),
}
