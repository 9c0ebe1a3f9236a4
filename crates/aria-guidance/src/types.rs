//! Rule and guidance definitions as authored in JSON.

use serde::{Deserialize, Serialize};

/// Importance assumed when a rule does not declare one.
pub const DEFAULT_IMPORTANCE: u32 = 1;

/// One trigger clause. A rule fires when any of its clauses matches.
///
/// ```json
/// { "kind": "keyword", "any": ["triangle"], "none": ["bermuda"] }
/// { "kind": "regex", "pattern": "\\bldf\\b", "flags": "i" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trigger {
    /// Substring match on the lower-cased window.
    Keyword {
        /// At least one must be present.
        any: Vec<String>,
        /// All must be present.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        all: Vec<String>,
        /// None may be present.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        none: Vec<String>,
    },
    /// Regular expression with JS-style flags.
    Regex {
        /// Pattern source.
        pattern: String,
        /// Flag letters (`i`, `m`, `s`, `x`; `g`, `u`, `y` are ignored).
        #[serde(default)]
        flags: String,
    },
}

impl Trigger {
    /// Keyword clause with only `any` terms.
    pub fn any<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keyword {
            any: terms.into_iter().map(Into::into).collect(),
            all: Vec::new(),
            none: Vec::new(),
        }
    }

    /// Regex clause.
    pub fn regex(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::Regex {
            pattern: pattern.into(),
            flags: flags.into(),
        }
    }
}

/// A rule: an ID, its clauses, and an optional importance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRule {
    /// Unique rule ID.
    pub id: String,
    /// Clauses, OR-ed together.
    pub triggers: Vec<Trigger>,
    /// Ranking weight; defaults to [`DEFAULT_IMPORTANCE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u32>,
}

/// A guidance item together with the rule that selects it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceDefinition {
    /// Unique ID, shared with the rule.
    pub id: String,
    /// Heading shown above the content.
    pub title: String,
    /// Trigger clauses.
    pub triggers: Vec<Trigger>,
    /// Ranking weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u32>,
    /// Full guidance text.
    pub content: String,
    /// Shorter fallback used when the full text does not fit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condensed: Option<String>,
}

impl GuidanceDefinition {
    /// The trigger rule of this item.
    pub fn rule(&self) -> TriggerRule {
        TriggerRule {
            id: self.id.clone(),
            triggers: self.triggers.clone(),
            importance: self.importance,
        }
    }
}

/// A rule that fired for the current window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// ID of the rule.
    pub rule_id: String,
    /// Terms or patterns that fired, in clause order, deduplicated.
    pub signals: Vec<String>,
    /// `importance * 10 + signals.len()`.
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_triggers() {
        let json = r#"{
            "id": "chainladder",
            "title": "Chainladder",
            "importance": 3,
            "content": "Use cl.Triangle.",
            "triggers": [
                {"kind": "keyword", "any": ["chainladder", "chain ladder"], "none": ["bermuda"]},
                {"kind": "regex", "pattern": "\\bldfs?\\b", "flags": "gi"}
            ]
        }"#;
        let def: GuidanceDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.importance, Some(3));
        assert!(def.condensed.is_none());
        assert_eq!(
            def.triggers[0],
            Trigger::Keyword {
                any: vec!["chainladder".into(), "chain ladder".into()],
                all: vec![],
                none: vec!["bermuda".into()],
            }
        );
        assert_eq!(def.triggers[1], Trigger::regex(r"\bldfs?\b", "gi"));
    }

    #[test]
    fn regex_flags_default_empty() {
        let t: Trigger = serde_json::from_str(r#"{"kind": "regex", "pattern": "x"}"#).unwrap();
        assert_eq!(t, Trigger::regex("x", ""));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let res: Result<Trigger, _> = serde_json::from_str(r#"{"kind": "semantic", "query": "x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn rule_from_definition() {
        let def = GuidanceDefinition {
            id: "a".into(),
            title: "A".into(),
            triggers: vec![Trigger::any(["x"])],
            importance: None,
            content: "body".into(),
            condensed: None,
        };
        let rule = def.rule();
        assert_eq!(rule.id, "a");
        assert_eq!(rule.triggers, vec![Trigger::any(["x"])]);
        assert_eq!(rule.importance, None);
    }
}
