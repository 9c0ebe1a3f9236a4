//! Guidance boundary used by prompt assembly.

use std::path::Path;
use std::sync::Arc;

use aria_core::errors::ConfigResult;
use aria_core::{CharRatioEstimator, TokenEstimator};
use aria_settings::GuidanceSettings;
use tracing::debug;

use crate::budget::{GuidanceSelection, select};
use crate::matcher::detect;
use crate::registry::GuidanceRegistry;
use crate::types::Detection;

/// Registry, estimator, and defaults wired together.
#[derive(Clone)]
pub struct GuidanceEngine {
    registry: Arc<GuidanceRegistry>,
    estimator: Arc<dyn TokenEstimator>,
    settings: GuidanceSettings,
}

impl GuidanceEngine {
    /// Engine with the `chars / 4` estimator.
    pub fn new(registry: GuidanceRegistry, settings: GuidanceSettings) -> Self {
        Self {
            registry: Arc::new(registry),
            estimator: Arc::new(CharRatioEstimator::default()),
            settings,
        }
    }

    /// Load the registry named by `settings.rules_path`, or start empty.
    ///
    /// Malformed definitions fail here, at startup.
    pub fn from_settings(settings: &GuidanceSettings) -> ConfigResult<Self> {
        let registry = match &settings.rules_path {
            Some(path) => GuidanceRegistry::from_path(Path::new(path))?,
            None => GuidanceRegistry::default(),
        };
        Ok(Self::new(registry, settings.clone()))
    }

    /// Replace the token estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// The registry.
    pub fn registry(&self) -> &GuidanceRegistry {
        &self.registry
    }

    /// Rules that fire for the configured window of `recent_turns`.
    pub fn detect<S: AsRef<str>>(&self, recent_turns: &[S]) -> Vec<Detection> {
        detect(recent_turns, self.registry.rules(), self.settings.window_turns)
    }

    /// Detect and select guidance for the prompt.
    ///
    /// `token_budget` falls back to the configured default.
    pub fn get_relevant_guidance<S: AsRef<str>>(
        &self,
        recent_turns: &[S],
        token_budget: Option<usize>,
    ) -> GuidanceSelection {
        let budget = token_budget.unwrap_or(self.settings.token_budget);
        let detections = self.detect(recent_turns);
        let selection = select(&detections, &self.registry, budget, self.estimator.as_ref());
        debug!(
            detected = detections.len(),
            included = ?selection.ids,
            budget,
            "guidance selected"
        );
        selection
    }
}
