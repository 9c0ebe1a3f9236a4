//! Trigger evaluation over the recent-dialogue window.

use crate::rules::CompiledRule;
use crate::types::Detection;

/// Join the last `window_turns` turns into one lower-cased window.
///
/// Turns are separated by a newline so terms never straddle two turns.
pub fn build_window<S: AsRef<str>>(recent_turns: &[S], window_turns: usize) -> String {
    let start = recent_turns.len().saturating_sub(window_turns);
    recent_turns[start..]
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Evaluate every rule against the window built from `recent_turns`.
///
/// Returns one [`Detection`] per matching rule, in rule order. The result
/// depends only on the arguments.
pub fn detect<S: AsRef<str>>(
    recent_turns: &[S],
    rules: &[CompiledRule],
    window_turns: usize,
) -> Vec<Detection> {
    let window = build_window(recent_turns, window_turns);
    if window.trim().is_empty() {
        return Vec::new();
    }
    rules
        .iter()
        .filter_map(|rule| evaluate(rule, &window))
        .collect()
}

fn evaluate(rule: &CompiledRule, window: &str) -> Option<Detection> {
    let mut signals: Vec<String> = Vec::new();
    let mut matched = false;
    for trigger in &rule.triggers {
        if let Some(fired) = trigger.signals(window) {
            matched = true;
            for s in fired {
                if !signals.contains(&s) {
                    signals.push(s);
                }
            }
        }
    }
    if !matched {
        return None;
    }
    let signal_count = u32::try_from(signals.len()).unwrap_or(u32::MAX);
    Some(Detection {
        rule_id: rule.id.clone(),
        score: rule.importance.saturating_mul(10).saturating_add(signal_count),
        signals,
    })
}
