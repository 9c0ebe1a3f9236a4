use serde::{Deserialize, Serialize};

/// Guidance selection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuidanceSettings {
    /// Default token budget for the guidance block.
    pub token_budget: usize,
    /// Number of most recent turns scanned for triggers.
    pub window_turns: usize,
    /// Optional JSON file with guidance definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<String>,
}

impl Default for GuidanceSettings {
    fn default() -> Self {
        Self {
            token_budget: 1500,
            window_turns: 3,
            rules_path: None,
        }
    }
}
