//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`AriaSettings::default()`]
//! 2. If `~/.aria/settings.json` exists, deep-merge user values over defaults
//! 3. Clamp numeric file values into the ranges env overrides accept
//! 4. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::AriaSettings;

// ── Accepted ranges (shared by file clamping and env parsing) ───────────────

const TOP_K: RangeInclusive<usize> = 1..=100;
const MIN_SCORE: RangeInclusive<f32> = 0.0..=1.0;
const TIMEOUT_MS: RangeInclusive<u64> = 100..=600_000;
const MAX_RETRIES: RangeInclusive<u64> = 0..=10;
const TOKEN_BUDGET: RangeInclusive<usize> = 0..=200_000;
const WINDOW_TURNS: RangeInclusive<usize> = 1..=20;

/// Resolve the path to the settings file (`~/.aria/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".aria").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<AriaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<AriaSettings> {
    let mut settings = load_file_layers(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
fn load_file_layers(path: &Path) -> Result<AriaSettings> {
    let defaults = serde_json::to_value(AriaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: AriaSettings = serde_json::from_value(merged)?;
    clamp_to_ranges(&mut settings);
    Ok(settings)
}

/// Pull out-of-range numeric values back into the accepted ranges.
///
/// Each adjustment is logged with the setting's JSON key.
pub fn clamp_to_ranges(settings: &mut AriaSettings) {
    let retrieval = &mut settings.retrieval;
    clamp_field("retrieval.topK", &mut retrieval.top_k, &TOP_K);
    clamp_field("retrieval.minScore", &mut retrieval.min_score, &MIN_SCORE);
    clamp_field("retrieval.timeoutMs", &mut retrieval.timeout_ms, &TIMEOUT_MS);
    let mut max_retries = u64::from(retrieval.retry.max_retries);
    clamp_field("retrieval.retry.maxRetries", &mut max_retries, &MAX_RETRIES);
    // bounded above, cannot truncate
    retrieval.retry.max_retries = u32::try_from(max_retries).unwrap_or(u32::MAX);

    let guidance = &mut settings.guidance;
    clamp_field("guidance.tokenBudget", &mut guidance.token_budget, &TOKEN_BUDGET);
    clamp_field("guidance.windowTurns", &mut guidance.window_turns, &WINDOW_TURNS);
}

fn clamp_field<T>(key: &str, value: &mut T, range: &RangeInclusive<T>)
where
    T: PartialOrd + Copy + Display,
{
    let clamped = if *value < *range.start() {
        *range.start()
    } else if *value > *range.end() {
        *range.end()
    } else {
        return;
    };
    warn!(key, value = %value, clamped = %clamped, "setting out of range, clamping");
    *value = clamped;
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut AriaSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides using `lookup` as the variable source.
///
/// Split out so tests can inject variables without touching the process
/// environment.
pub fn apply_overrides_from<F>(settings: &mut AriaSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Retrieval ───────────────────────────────────────────────────
    if let Some(v) = env.bool("ARIA_RETRIEVAL_ENABLED") {
        settings.retrieval.enabled = v;
    }
    if let Some(v) = env.string("ARIA_INDEX_PATH") {
        settings.retrieval.index_path = v;
    }
    if let Some(v) = env.string("ARIA_EMBEDDING_BASE_URL") {
        settings.retrieval.embedding_base_url = v;
    }
    if let Some(v) = env.string("ARIA_EMBEDDING_MODEL") {
        settings.retrieval.embedding_model = v;
    }
    if let Some(v) = env.usize("ARIA_RETRIEVAL_TOP_K", &TOP_K) {
        settings.retrieval.top_k = v;
    }
    if let Some(v) = env.f32("ARIA_RETRIEVAL_MIN_SCORE", &MIN_SCORE) {
        settings.retrieval.min_score = v;
    }
    if let Some(v) = env.u64("ARIA_EMBEDDING_TIMEOUT_MS", &TIMEOUT_MS) {
        settings.retrieval.timeout_ms = v;
    }
    if let Some(v) = env.u64("ARIA_EMBEDDING_MAX_RETRIES", &MAX_RETRIES) {
        // bounded above, cannot truncate
        settings.retrieval.retry.max_retries = u32::try_from(v).unwrap_or(u32::MAX);
    }

    // ── Guidance ────────────────────────────────────────────────────
    if let Some(v) = env.usize("ARIA_GUIDANCE_TOKEN_BUDGET", &TOKEN_BUDGET) {
        settings.guidance.token_budget = v;
    }
    if let Some(v) = env.usize("ARIA_GUIDANCE_WINDOW_TURNS", &WINDOW_TURNS) {
        settings.guidance.window_turns = v;
    }
    if let Some(v) = env.string("ARIA_GUIDANCE_RULES_PATH") {
        settings.guidance.rules_path = Some(v);
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a finite `f32` within a range.
pub fn parse_f32_range(val: &str, min: f32, max: f32) -> Option<f32> {
    let n: f32 = val.parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, name: &str, kind: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let val = (self.lookup)(name)?;
        let result = parse(&val);
        if result.is_none() {
            warn!(key = name, value = %val, kind, "invalid env var, ignoring");
        }
        result
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.parsed(name, "bool", parse_bool)
    }

    fn u64(&self, name: &str, range: &RangeInclusive<u64>) -> Option<u64> {
        self.parsed(name, "u64", |v| {
            parse_u64_range(v, *range.start(), *range.end())
        })
    }

    fn usize(&self, name: &str, range: &RangeInclusive<usize>) -> Option<usize> {
        self.parsed(name, "usize", |v| {
            parse_usize_range(v, *range.start(), *range.end())
        })
    }

    fn f32(&self, name: &str, range: &RangeInclusive<f32>) -> Option<f32> {
        self.parsed(name, "f32", |v| {
            parse_f32_range(v, *range.start(), *range.end())
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"retrieval": {"topK": 5, "minScore": 0.5}});
        let source = serde_json::json!({"retrieval": {"topK": 3}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["retrieval"]["topK"], 3);
        assert_eq!(merged["retrieval"]["minScore"], 0.5);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4, 5]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4, 5]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── load_file_layers ────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file_layers(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, AriaSettings::default());
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"retrieval": {"topK": 8, "retry": {"maxRetries": 4}}, "guidance": {"windowTurns": 2}}"#,
        )
        .unwrap();

        let settings = load_file_layers(&path).unwrap();
        assert_eq!(settings.retrieval.top_k, 8);
        assert_eq!(settings.retrieval.retry.max_retries, 4);
        assert_eq!(settings.retrieval.retry.base_delay_ms, 250);
        assert_eq!(settings.guidance.window_turns, 2);
        assert_eq!(settings.guidance.token_budget, 1500);
    }

    #[test]
    fn load_clamps_out_of_range_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "retrieval": {"topK": 0, "minScore": 2.5, "timeoutMs": 0, "retry": {"maxRetries": 4000000000}},
                "guidance": {"windowTurns": 50, "tokenBudget": 900000}
            }"#,
        )
        .unwrap();

        let settings = load_file_layers(&path).unwrap();
        assert_eq!(settings.retrieval.top_k, 1);
        assert!((settings.retrieval.min_score - 1.0).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.timeout_ms, 100);
        assert_eq!(settings.retrieval.retry.max_retries, 10);
        assert_eq!(settings.guidance.window_turns, 20);
        assert_eq!(settings.guidance.token_budget, 200_000);
    }

    #[test]
    fn clamp_leaves_defaults_untouched() {
        let mut settings = AriaSettings::default();
        clamp_to_ranges(&mut settings);
        assert_eq!(settings, AriaSettings::default());
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_file_layers(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let mut settings = AriaSettings::default();
        apply_overrides_from(
            &mut settings,
            lookup(&[
                ("ARIA_INDEX_PATH", "/data/idx.json"),
                ("ARIA_RETRIEVAL_TOP_K", "7"),
                ("ARIA_RETRIEVAL_MIN_SCORE", "0.65"),
                ("ARIA_RETRIEVAL_ENABLED", "off"),
                ("ARIA_EMBEDDING_MAX_RETRIES", "0"),
                ("ARIA_GUIDANCE_TOKEN_BUDGET", "800"),
                ("ARIA_GUIDANCE_WINDOW_TURNS", "5"),
                ("ARIA_GUIDANCE_RULES_PATH", "/data/rules.json"),
            ]),
        );
        assert_eq!(settings.retrieval.index_path, "/data/idx.json");
        assert_eq!(settings.retrieval.top_k, 7);
        assert!((settings.retrieval.min_score - 0.65).abs() < 1e-6);
        assert!(!settings.retrieval.enabled);
        assert_eq!(settings.retrieval.retry.max_retries, 0);
        assert_eq!(settings.guidance.token_budget, 800);
        assert_eq!(settings.guidance.window_turns, 5);
        assert_eq!(settings.guidance.rules_path.as_deref(), Some("/data/rules.json"));
    }

    #[test]
    fn env_invalid_values_ignored() {
        let mut settings = AriaSettings::default();
        apply_overrides_from(
            &mut settings,
            lookup(&[
                ("ARIA_RETRIEVAL_TOP_K", "0"),
                ("ARIA_RETRIEVAL_MIN_SCORE", "1.5"),
                ("ARIA_EMBEDDING_TIMEOUT_MS", "abc"),
                ("ARIA_RETRIEVAL_ENABLED", "maybe"),
                ("ARIA_INDEX_PATH", ""),
            ]),
        );
        assert_eq!(settings, AriaSettings::default());
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in &["true", "1", "yes", "on", "TRUE"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "no", "off", "Off"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u64_range("500", 100, 1000), Some(500));
        assert_eq!(parse_u64_range("50", 100, 1000), None);
        assert_eq!(parse_usize_range("-1", 0, 10), None);
        assert_eq!(parse_f32_range("0.3", 0.0, 1.0), Some(0.3));
        assert_eq!(parse_f32_range("NaN", 0.0, 1.0), None);
    }
}
