//! # aria-settings
//!
//! Configuration for the context augmentation engine, loaded from three
//! layers (in priority order):
//! 1. **Compiled defaults** - [`AriaSettings::default()`]
//! 2. **User file** - `~/.aria/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** - `ARIA_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use aria_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("top-k: {}", settings.retrieval.top_k);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton, initialized on first access.
static SETTINGS: OnceLock<AriaSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads `~/.aria/settings.json` with env var overrides. If
/// loading fails the error is logged and compiled defaults are used.
pub fn get_settings() -> &'static AriaSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            AriaSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: AriaSettings) -> std::result::Result<(), AriaSettings> {
    SETTINGS.set(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = AriaSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = AriaSettings::default();
        assert!(settings.retrieval.enabled);
        assert_eq!(settings.retrieval.embedding_model, "models/text-embedding-004");
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.retrieval.retry.max_retries, 2);
        assert_eq!(settings.guidance.token_budget, 1500);
        assert_eq!(settings.guidance.window_turns, 3);
        assert!(settings.guidance.rules_path.is_none());
    }

    #[test]
    fn get_settings_is_stable() {
        let a: *const AriaSettings = get_settings();
        let b: *const AriaSettings = get_settings();
        assert_eq!(a, b);
    }
}
