//! Rule compilation.
//!
//! Rules compile once at load time. Keyword terms are lower-cased to match
//! the lower-cased window. Regexes are built from JS-style flag strings.

use aria_core::ConfigError;
use aria_core::errors::ConfigResult;
use regex::{Regex, RegexBuilder};

use crate::types::{DEFAULT_IMPORTANCE, Trigger, TriggerRule};

/// A compiled trigger clause.
#[derive(Clone, Debug)]
pub enum CompiledTrigger {
    /// Lower-cased keyword sets.
    Keyword {
        /// OR terms.
        any: Vec<String>,
        /// AND terms.
        all: Vec<String>,
        /// Exclusion terms.
        none: Vec<String>,
    },
    /// Compiled pattern plus its source, used as the signal.
    Regex {
        /// Compiled regex.
        regex: Regex,
        /// Pattern as written.
        source: String,
    },
}

impl CompiledTrigger {
    /// Signals produced when this clause matches `window`, or `None`.
    ///
    /// `window` must already be lower-cased.
    pub fn signals(&self, window: &str) -> Option<Vec<String>> {
        match self {
            Self::Keyword { any, all, none } => {
                if none.iter().any(|t| window.contains(t.as_str())) {
                    return None;
                }
                if !all.iter().all(|t| window.contains(t.as_str())) {
                    return None;
                }
                let hits: Vec<String> = any
                    .iter()
                    .filter(|t| window.contains(t.as_str()))
                    .cloned()
                    .collect();
                if hits.is_empty() {
                    return None;
                }
                Some(hits.into_iter().chain(all.iter().cloned()).collect())
            }
            Self::Regex { regex, source } => regex.is_match(window).then(|| vec![source.clone()]),
        }
    }
}

/// A rule ready for matching.
#[derive(Clone, Debug)]
pub struct CompiledRule {
    /// Rule ID.
    pub id: String,
    /// Ranking weight.
    pub importance: u32,
    /// Clauses, OR-ed together.
    pub triggers: Vec<CompiledTrigger>,
}

impl CompiledRule {
    /// Compile a rule, rejecting anything that could never match sensibly.
    pub fn compile(rule: &TriggerRule) -> ConfigResult<Self> {
        let invalid = |message: String| ConfigError::InvalidRule {
            rule_id: rule.id.clone(),
            message,
        };

        if rule.id.trim().is_empty() {
            return Err(invalid("rule id is empty".into()));
        }
        if rule.triggers.is_empty() {
            return Err(invalid("rule has no triggers".into()));
        }

        let triggers = rule
            .triggers
            .iter()
            .map(|t| compile_trigger(t).map_err(&invalid))
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self {
            id: rule.id.clone(),
            importance: rule.importance.unwrap_or(DEFAULT_IMPORTANCE),
            triggers,
        })
    }
}

fn compile_trigger(trigger: &Trigger) -> Result<CompiledTrigger, String> {
    match trigger {
        Trigger::Keyword { any, all, none } => {
            if any.is_empty() {
                return Err("keyword trigger needs at least one `any` term".into());
            }
            Ok(CompiledTrigger::Keyword {
                any: lower_terms(any, "any")?,
                all: lower_terms(all, "all")?,
                none: lower_terms(none, "none")?,
            })
        }
        Trigger::Regex { pattern, flags } => Ok(CompiledTrigger::Regex {
            regex: compile_regex(pattern, flags)?,
            source: pattern.clone(),
        }),
    }
}

fn lower_terms(terms: &[String], field: &str) -> Result<Vec<String>, String> {
    terms
        .iter()
        .map(|t| {
            if t.trim().is_empty() {
                Err(format!("blank term in `{field}`"))
            } else {
                Ok(t.to_lowercase())
            }
        })
        .collect()
}

/// Build a regex from a pattern and JS-style flags.
///
/// `i`, `m`, `s`, `x` map to the matching builder options. `g`, `u`, `y`
/// have no meaning for a single test and are ignored. Any other flag is an
/// error.
pub fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, String> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                let _ = builder.case_insensitive(true);
            }
            'm' => {
                let _ = builder.multi_line(true);
            }
            's' => {
                let _ = builder.dot_matches_new_line(true);
            }
            'x' => {
                let _ = builder.ignore_whitespace(true);
            }
            'g' | 'u' | 'y' => {}
            other => return Err(format!("unsupported regex flag `{other}`")),
        }
    }
    builder
        .build()
        .map_err(|e| format!("invalid pattern `{pattern}`: {e}"))
}
