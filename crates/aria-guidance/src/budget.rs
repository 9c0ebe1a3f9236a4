//! Budgeted selection of guidance items.
//!
//! Every piece of the output block is charged against the budget: the
//! fixed frame first, then for each included item its body and its line in
//! the active-guidance listing. An item is included in full if that fits,
//! else in its condensed form if one exists and fits, else skipped.

use aria_core::TokenEstimator;
use serde::Serialize;
use tracing::debug;

use crate::registry::GuidanceRegistry;
use crate::types::{Detection, GuidanceDefinition};

const PREAMBLE: &str = "<procedural_guidance>\n\
The guidance below was selected for this conversation. It reflects established \
house procedure: follow it unless the user explicitly asks otherwise, and prefer \
it over general knowledge when the two conflict.\n\n";

const LISTING_HEADER: &str = "Active guidance (id: triggering signals):\n";

const POSTAMBLE: &str = "</procedural_guidance>\n";

/// Outcome of [`select`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GuidanceSelection {
    /// Whether any item was included.
    pub found: bool,
    /// IDs of included items, in block order.
    pub ids: Vec<String>,
    /// Signals of included items, deduplicated.
    pub signals: Vec<String>,
    /// Rendered block; empty when nothing was included.
    pub block: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rendering {
    Full,
    Condensed,
}

struct Included<'a> {
    detection: &'a Detection,
    body: String,
}

/// Rank detections and assemble a block that costs at most `budget`.
///
/// Detections are ordered by score, highest first; ties keep input order.
/// Detections whose ID is not in `registry` are skipped.
pub fn select(
    detections: &[Detection],
    registry: &GuidanceRegistry,
    budget: usize,
    estimator: &dyn TokenEstimator,
) -> GuidanceSelection {
    let frame_cost = estimator.estimate(PREAMBLE)
        + estimator.estimate(LISTING_HEADER)
        + estimator.estimate(POSTAMBLE);
    if detections.is_empty() || frame_cost > budget {
        return GuidanceSelection::default();
    }

    let mut ranked: Vec<&Detection> = detections.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let mut remaining = budget - frame_cost;
    let mut included: Vec<Included<'_>> = Vec::new();

    for detection in ranked {
        let Some(definition) = registry.get(&detection.rule_id) else {
            debug!(rule_id = %detection.rule_id, "detection has no guidance definition");
            continue;
        };
        let line_cost = estimator.estimate(&listing_line(detection));

        let mut choice = None;
        for rendering in [Rendering::Full, Rendering::Condensed] {
            let Some(body) = render(definition, rendering) else {
                continue;
            };
            let cost = estimator.estimate(&body) + line_cost;
            if cost <= remaining {
                choice = Some((rendering, body, cost));
                break;
            }
        }

        match choice {
            Some((rendering, body, cost)) => {
                remaining -= cost;
                debug!(id = %definition.id, ?rendering, cost, remaining, "guidance included");
                included.push(Included { detection, body });
            }
            None => debug!(id = %definition.id, remaining, "guidance skipped, over budget"),
        }
    }

    // The pieces were charged separately; re-check the assembled block in
    // case the estimator is not subadditive.
    loop {
        if included.is_empty() {
            return GuidanceSelection::default();
        }
        let block = assemble(&included);
        if estimator.estimate(&block) <= budget {
            return finish(&included, block);
        }
        let _ = included.pop();
    }
}

fn render(definition: &GuidanceDefinition, rendering: Rendering) -> Option<String> {
    match rendering {
        Rendering::Full => Some(format!(
            "## {}\n\n{}\n\n",
            definition.title.trim(),
            definition.content.trim()
        )),
        Rendering::Condensed => definition
            .condensed
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("## {} (condensed)\n\n{}\n\n", definition.title.trim(), c.trim())),
    }
}

fn listing_line(detection: &Detection) -> String {
    format!("- {}: {}\n", detection.rule_id, detection.signals.join(", "))
}

fn assemble(included: &[Included<'_>]) -> String {
    let mut block = String::from(PREAMBLE);
    for item in included {
        block.push_str(&item.body);
    }
    block.push_str(LISTING_HEADER);
    for item in included {
        block.push_str(&listing_line(item.detection));
    }
    block.push_str(POSTAMBLE);
    block
}

fn finish(included: &[Included<'_>], block: String) -> GuidanceSelection {
    let mut signals: Vec<String> = Vec::new();
    for item in included {
        for s in &item.detection.signals {
            if !signals.contains(s) {
                signals.push(s.clone());
            }
        }
    }
    GuidanceSelection {
        found: true,
        ids: included
            .iter()
            .map(|i| i.detection.rule_id.clone())
            .collect(),
        signals,
        block,
    }
}
