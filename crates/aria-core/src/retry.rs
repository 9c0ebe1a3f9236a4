//! Retry configuration and backoff calculation.
//!
//! Portable, sync-only building blocks. The async retry loop around the
//! embedding call lives in `aria-retrieval`, which owns the HTTP client.
//!
//! - [`RetryConfig`]: retry parameters (max retries, backoff, jitter)
//! - [`calculate_backoff_delay`]: exponential backoff with a caller-supplied random
//! - [`parse_retry_after_header`]: parse `Retry-After` HTTP header

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default maximum retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 250;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 4_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Configuration for retry logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 2).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in ms (default: 250).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between retries in ms (default: 4000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.2).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff delay for a zero-based retry index with the given random value.
    pub fn delay_for(&self, attempt: u32, random: f64) -> u64 {
        calculate_backoff_delay(
            attempt,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_factor,
            random,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff calculation
// ─────────────────────────────────────────────────────────────────────────────

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (2r - 1) * jitter)`
///
/// `random` should be a value in `[0.0, 1.0)` from a PRNG. The jitter is
/// symmetric: a factor of 0.2 varies the delay by ±20%.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn calculate_backoff_delay(
    attempt: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
    random: f64,
) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(max_delay_ms);

    let jitter_factor = jitter_factor.clamp(0.0, 1.0);
    let random = random.clamp(0.0, 1.0);
    let jitter = 1.0 + (random * 2.0 - 1.0) * jitter_factor;
    let with_jitter = (capped as f64) * jitter;

    with_jitter.round().max(0.0) as u64
}

// ─────────────────────────────────────────────────────────────────────────────
// Retry-After header parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a `Retry-After` HTTP header value.
///
/// The value can be either a number of seconds (`"120"`) or an HTTP-date
/// (`"Thu, 01 Dec 2025 16:00:00 GMT"`). Returns the delay in milliseconds,
/// or `None` if parsing fails.
#[must_use]
pub fn parse_retry_after_header(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds.saturating_mul(1000));
    }

    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delay_ms = date
        .signed_duration_since(chrono::Utc::now())
        .num_milliseconds();
    Some(u64::try_from(delay_ms).unwrap_or(0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- RetryConfig --

    #[test]
    fn retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_delay_ms, 250);
        assert_eq!(config.max_delay_ms, 4_000);
        assert!((config.jitter_factor - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn retry_config_serde_defaults() {
        let config: RetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());
    }

    #[test]
    fn retry_config_camel_case() {
        let value = serde_json::to_value(RetryConfig::default()).unwrap();
        assert!(value.get("maxRetries").is_some());
        assert!(value.get("jitterFactor").is_some());
    }

    #[test]
    fn retry_config_none_disables_retries() {
        assert_eq!(RetryConfig::none().max_retries, 0);
    }

    // -- calculate_backoff_delay --

    #[test]
    fn backoff_exponential_growth() {
        let delays: Vec<u64> = (0..4)
            .map(|a| calculate_backoff_delay(a, 1000, 60_000, 0.0, 0.5))
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000]);
    }

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(calculate_backoff_delay(10, 1000, 60_000, 0.0, 0.5), 60_000);
    }

    #[test]
    fn backoff_jitter_bounds() {
        // random = 0.0 → 0.8x, 0.5 → 1.0x, 1.0 → 1.2x
        assert_eq!(calculate_backoff_delay(0, 1000, 60_000, 0.2, 0.0), 800);
        assert_eq!(calculate_backoff_delay(0, 1000, 60_000, 0.2, 0.5), 1000);
        assert_eq!(calculate_backoff_delay(0, 1000, 60_000, 0.2, 1.0), 1200);
    }

    #[test]
    fn backoff_high_attempt_no_overflow() {
        let delay = calculate_backoff_delay(100, 1000, 60_000, 0.2, 0.99);
        assert!(delay <= 72_000);
    }

    #[test]
    fn delay_for_uses_config() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            jitter_factor: 0.0,
        };
        assert_eq!(config.delay_for(0, 0.3), 100);
        assert_eq!(config.delay_for(2, 0.3), 400);
        assert_eq!(config.delay_for(5, 0.3), 1_000);
    }

    // -- parse_retry_after_header --

    #[test]
    fn parse_retry_after_seconds() {
        assert_eq!(parse_retry_after_header("120"), Some(120_000));
        assert_eq!(parse_retry_after_header(" 1 "), Some(1000));
    }

    #[test]
    fn parse_retry_after_invalid() {
        assert_eq!(parse_retry_after_header("not-a-number"), None);
        assert_eq!(parse_retry_after_header(""), None);
    }

    #[test]
    fn parse_retry_after_past_date() {
        use chrono::{TimeZone, Utc};
        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().to_rfc2822();
        assert_eq!(parse_retry_after_header(&past), Some(0));
    }

    #[test]
    fn parse_retry_after_future_date() {
        use chrono::{TimeZone, Utc};
        let future = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap().to_rfc2822();
        assert!(parse_retry_after_header(&future).is_some_and(|ms| ms > 0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn backoff_within_jitter_envelope(
                attempt in 0u32..40,
                base in 1u64..5_000,
                random in 0.0f64..1.0,
            ) {
                let max = 60_000;
                let delay = calculate_backoff_delay(attempt, base, max, 0.2, random);
                prop_assert!(delay <= 72_000);
            }
        }
    }
}
