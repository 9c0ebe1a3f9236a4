//! Guidance definitions and their compiled rules.

use std::collections::HashMap;
use std::path::Path;

use aria_core::ConfigError;
use aria_core::errors::ConfigResult;
use tracing::info;

use crate::rules::CompiledRule;
use crate::types::GuidanceDefinition;

/// Immutable set of guidance items, validated at construction.
#[derive(Clone, Debug, Default)]
pub struct GuidanceRegistry {
    definitions: Vec<GuidanceDefinition>,
    by_id: HashMap<String, usize>,
    rules: Vec<CompiledRule>,
}

impl GuidanceRegistry {
    /// Build from definitions. Duplicate IDs and malformed rules are errors.
    pub fn from_definitions(definitions: Vec<GuidanceDefinition>) -> ConfigResult<Self> {
        let mut by_id = HashMap::with_capacity(definitions.len());
        let mut rules = Vec::with_capacity(definitions.len());
        for (pos, def) in definitions.iter().enumerate() {
            if by_id.insert(def.id.clone(), pos).is_some() {
                return Err(ConfigError::DuplicateRule {
                    rule_id: def.id.clone(),
                });
            }
            rules.push(CompiledRule::compile(&def.rule())?);
        }
        Ok(Self {
            definitions,
            by_id,
            rules,
        })
    }

    /// Parse a JSON array of definitions.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let definitions: Vec<GuidanceDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    /// Load a JSON array of definitions from disk.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&content)?;
        info!(path = %path.display(), items = registry.len(), "guidance registry loaded");
        Ok(registry)
    }

    /// Definition by ID.
    pub fn get(&self, id: &str) -> Option<&GuidanceDefinition> {
        self.by_id.get(id).map(|&pos| &self.definitions[pos])
    }

    /// Compiled rules, in definition order.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// All definitions, in load order.
    pub fn definitions(&self) -> &[GuidanceDefinition] {
        &self.definitions
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
