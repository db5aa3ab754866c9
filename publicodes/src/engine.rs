use crate::evaluator::{Evaluator, Target};
use crate::parser::{parse_expression, rules::normalize_rule_name};
use crate::semantic::{Expression, ExpressionKind, RuleDefinition};
use crate::situation::parse_situation;
use crate::validator::resolve_references;
use crate::{
    Evaluation, PublicodesError, PublicodesResult, ResourceLimits, RuleSet, Situation,
    SituationOptions,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// An evaluation context: a shared rule set plus a situation.
///
/// Branching with [`Engine::shallow_copy`] is cheap: the rule set is shared
/// through an `Arc` and only the situation is cloned.
#[derive(Debug, Clone)]
pub struct Engine {
    rules: Arc<RuleSet>,
    situation: Situation,
    parsed_situation: HashMap<String, Expression>,
    limits: ResourceLimits,
}

impl Engine {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self::with_limits(rules, ResourceLimits::default())
    }

    /// Create an engine with custom resource limits
    pub fn with_limits(rules: Arc<RuleSet>, limits: ResourceLimits) -> Self {
        Self {
            rules,
            situation: Situation::new(),
            parsed_situation: HashMap::new(),
            limits,
        }
    }

    /// Load a rule set from JSON and create an engine with an empty situation
    pub fn from_json(content: &str) -> PublicodesResult<Self> {
        Self::from_json_with_limits(content, ResourceLimits::default())
    }

    pub fn from_json_with_limits(content: &str, limits: ResourceLimits) -> PublicodesResult<Self> {
        let rules = RuleSet::from_json_with_limits(content, &limits)?;
        Ok(Self::with_limits(Arc::new(rules), limits))
    }

    pub fn from_value(value: &serde_json::Value) -> PublicodesResult<Self> {
        let limits = ResourceLimits::default();
        let rules = RuleSet::from_value(value, &limits)?;
        Ok(Self::with_limits(Arc::new(rules), limits))
    }

    /// Get the current resource limits
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// A new engine sharing the rule set, with its own copy of the situation
    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }

    pub fn situation(&self) -> &Situation {
        &self.situation
    }

    /// Replace the situation
    ///
    /// On error the previous situation is kept.
    pub fn set_situation(&mut self, situation: Situation) -> PublicodesResult<&mut Self> {
        self.set_situation_with_options(situation, SituationOptions::default())
    }

    pub fn set_situation_with_options(
        &mut self,
        situation: Situation,
        options: SituationOptions,
    ) -> PublicodesResult<&mut Self> {
        let situation = if options.keep_previous_situation {
            let mut merged = self.situation.clone();
            merged.merge(situation);
            merged
        } else {
            situation
        };

        let parsed = parse_situation(&situation, &self.rules, &self.limits)?;
        debug!(
            entries = situation.len(),
            kept_previous = options.keep_previous_situation,
            "situation set"
        );
        self.situation = situation;
        self.parsed_situation = parsed;
        Ok(self)
    }

    /// Set the situation on an owned engine, for chaining on a fresh branch
    pub fn with_situation(mut self, situation: Situation) -> PublicodesResult<Self> {
        self.set_situation(situation)?;
        Ok(self)
    }

    pub fn get_rule(&self, name: &str) -> Option<&RuleDefinition> {
        let name = normalize_rule_name(name).ok()?;
        self.rules.get(&name)
    }

    /// All rule names, sorted
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.rule_names()
    }

    /// Evaluate a rule by name, or else an expression written at the root namespace
    pub fn evaluate(&self, target: &str) -> PublicodesResult<Evaluation> {
        let evaluator = Evaluator::new(&self.rules, &self.parsed_situation, &self.limits);

        if let Ok(name) = normalize_rule_name(target) {
            if self.rules.contains(&name) {
                return evaluator.evaluate(target, Target::Rule(&name));
            }
        }

        let expr = self.parse_target(target)?;
        evaluator.evaluate(target, Target::Expression(&expr))
    }

    fn parse_target(&self, target: &str) -> PublicodesResult<Expression> {
        let mut expr = parse_expression(target, "<expression>", &self.limits)?;
        let names: HashSet<String> = self
            .rules
            .rule_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        match resolve_references(&mut expr, "", &names) {
            Ok(()) => Ok(expr),
            Err(_) if matches!(expr.kind, ExpressionKind::Reference(_)) => {
                Err(PublicodesError::UnknownRule(target.trim().to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
