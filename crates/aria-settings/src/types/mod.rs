//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so partial JSON files work: missing fields get their default value.

mod guidance;
mod retrieval;

pub use guidance::*;
pub use retrieval::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "retrieval": { "topK": 3, "minScore": 0.6 },
///   "guidance": { "tokenBudget": 800 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AriaSettings {
    /// Semantic retrieval over the knowledge index.
    pub retrieval: RetrievalSettings,
    /// Rule-triggered guidance selection.
    pub guidance: GuidanceSettings,
}
