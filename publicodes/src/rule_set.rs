//! The immutable, name-indexed rule catalog
//!
//! A `RuleSet` is loaded once from a precompiled JSON artifact and then
//! shared read-only (behind an `Arc`) by every engine branched from it.

use crate::parser::{parse_rule_set, rules::parse_rules_value};
use crate::semantic::{ancestor_names, RuleDefinition, NAME_SEPARATOR};
use crate::validator::{resolve_name, Validator};
use crate::{PublicodesResult, ResourceLimits};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: HashMap<String, RuleDefinition>,
    evaluation_order: Vec<String>,
}

impl RuleSet {
    /// Load a rule set from the JSON produced by the rules build step
    pub fn from_json(content: &str) -> PublicodesResult<Self> {
        Self::from_json_with_limits(content, &ResourceLimits::default())
    }

    pub fn from_json_with_limits(content: &str, limits: &ResourceLimits) -> PublicodesResult<Self> {
        Self::from_definitions(parse_rule_set(content, limits)?)
    }

    /// Load a rule set from an already deserialized JSON value
    pub fn from_value(value: &serde_json::Value, limits: &ResourceLimits) -> PublicodesResult<Self> {
        Self::from_definitions(parse_rules_value(value, limits)?)
    }

    /// Validate parsed definitions (possibly gathered from several files)
    pub fn from_definitions(definitions: Vec<RuleDefinition>) -> PublicodesResult<Self> {
        let validated = Validator::new().validate(definitions)?;
        debug!(rules = validated.rules.len(), "rule set loaded");
        Ok(Self {
            rules: validated.rules,
            evaluation_order: validated.evaluation_order,
        })
    }

    pub fn get(&self, name: &str) -> Option<&RuleDefinition> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rule names, sorted
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn rules(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.values()
    }

    /// Rule names ordered so that every rule comes after the rules it references
    pub fn evaluation_order(&self) -> &[String] {
        &self.evaluation_order
    }

    /// True when some rule lives in the namespace `name`
    pub fn has_children(&self, name: &str) -> bool {
        let prefix = format!("{}{}", name, NAME_SEPARATOR);
        self.rules.keys().any(|other| other.starts_with(&prefix))
    }

    /// Enclosing namespace rules of `name`, innermost first
    pub fn ancestors<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RuleDefinition> {
        ancestor_names(name).filter_map(|ancestor| self.rules.get(ancestor))
    }

    /// Resolve a name written inside rule `context` (empty for the root)
    pub fn resolve(&self, written: &str, context: &str) -> Option<String> {
        resolve_name(written, context, |candidate| self.contains(candidate))
    }
}
