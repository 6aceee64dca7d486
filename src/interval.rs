//! Interval normalization
//!
//! Canonicalizes a requested interval token into an [`IntervalSpec`]:
//! - `Nh` becomes `(N*60)m`
//! - `1s`/`15s` stay in seconds for heart rate, become minutes otherwise
//! - only `1`/`01`/`15` seconds or minutes are accepted besides hours

use crate::error::ComputeError;
use crate::types::{IntervalSpec, IntervalUnit, MetricType};

/// Normalizer for user-supplied interval tokens
pub struct IntervalNormalizer;

impl IntervalNormalizer {
    /// Normalize an interval token for the given metric
    pub fn normalize(token: &str, metric: MetricType) -> Result<IntervalSpec, ComputeError> {
        let invalid = || ComputeError::InvalidInterval(token.to_string());

        let (digits, unit) = split_token(token).ok_or_else(invalid)?;

        match unit {
            'h' => {
                let hours: u32 = digits.parse().map_err(|_| invalid())?;
                if hours == 0 {
                    return Err(invalid());
                }
                let minutes = hours.checked_mul(60).ok_or_else(invalid)?;
                Ok(IntervalSpec::minutes(minutes))
            }
            's' | 'm' => {
                let magnitude = match digits {
                    "1" | "01" => 1,
                    "15" => 15,
                    _ => return Err(invalid()),
                };
                // Seconds only survive for metrics stored at one-second resolution
                if unit == 's' && metric.base_resolution().unit == IntervalUnit::Seconds {
                    Ok(IntervalSpec::seconds(magnitude))
                } else {
                    Ok(IntervalSpec::minutes(magnitude))
                }
            }
            _ => Err(invalid()),
        }
    }
}

/// Split `"15m"` into `("15", 'm')`; digits must be ASCII and non-empty
fn split_token(token: &str) -> Option<(&str, char)> {
    let (idx, unit) = token.char_indices().last()?;
    let digits = &token[..idx];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((digits, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hours_promote_to_minutes() {
        assert_eq!(
            IntervalNormalizer::normalize("10h", MetricType::Steps).unwrap(),
            IntervalSpec::minutes(600)
        );
        assert_eq!(
            IntervalNormalizer::normalize("1h", MetricType::HeartRate).unwrap(),
            IntervalSpec::minutes(60)
        );
    }

    #[test]
    fn test_seconds_kept_for_heart_rate_only() {
        assert_eq!(
            IntervalNormalizer::normalize("15s", MetricType::HeartRate).unwrap(),
            IntervalSpec::seconds(15)
        );
        assert_eq!(
            IntervalNormalizer::normalize("15s", MetricType::Calories).unwrap(),
            IntervalSpec::minutes(15)
        );
        assert_eq!(
            IntervalNormalizer::normalize("1s", MetricType::Distance).unwrap(),
            IntervalSpec::minutes(1)
        );
    }

    #[test]
    fn test_minutes_accepted() {
        assert_eq!(
            IntervalNormalizer::normalize("1m", MetricType::Steps).unwrap(),
            IntervalSpec::minutes(1)
        );
        assert_eq!(
            IntervalNormalizer::normalize("01m", MetricType::HeartRate).unwrap(),
            IntervalSpec::minutes(1)
        );
        assert_eq!(
            IntervalNormalizer::normalize("15m", MetricType::ActiveMinutes).unwrap(),
            IntervalSpec::minutes(15)
        );
    }

    #[test]
    fn test_rejects_tokens_outside_enumeration() {
        for token in [
            "30M", "0h", "1sec", "7d", "30m", "2s", "", "h", "m", "-1h", "1.5h", "99999999999h",
        ] {
            let result = IntervalNormalizer::normalize(token, MetricType::HeartRate);
            assert!(
                matches!(result, Err(ComputeError::InvalidInterval(_))),
                "token {token:?} should be rejected"
            );
        }
    }
}
