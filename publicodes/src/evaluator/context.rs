//! Evaluation context for one call to `Engine::evaluate`
//!
//! Contains all state needed during a single evaluation: the shared rule
//! set, the parsed situation, and the per-call caches and records.

use super::timeout::TimeoutTracker;
use crate::semantic::Expression;
use crate::{OperationResult, PublicodesError, PublicodesResult, ResourceLimits, RuleSet};
use std::collections::{BTreeSet, HashMap, HashSet};

pub struct EvaluationContext<'a> {
    pub rules: &'a RuleSet,

    /// Situation entries, parsed and resolved, keyed by full rule name
    pub situation: &'a HashMap<String, Expression>,

    pub limits: &'a ResourceLimits,

    timeout: TimeoutTracker,

    /// Rule results computed so far in this call, with the inputs each one missed
    cache: HashMap<String, (OperationResult, BTreeSet<String>)>,

    /// Rules currently being evaluated, outermost first
    stack: Vec<String>,

    /// Rules whose applicability is currently being checked for a descendant
    checking_applicability: HashSet<String>,

    /// Leaf rules that had neither a situation entry nor a default
    pub missing: BTreeSet<String>,

    /// Every rule visited
    pub traversed: BTreeSet<String>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        rules: &'a RuleSet,
        situation: &'a HashMap<String, Expression>,
        limits: &'a ResourceLimits,
    ) -> Self {
        Self {
            rules,
            situation,
            limits,
            timeout: TimeoutTracker::new(),
            cache: HashMap::new(),
            stack: Vec::new(),
            checking_applicability: HashSet::new(),
            missing: BTreeSet::new(),
            traversed: BTreeSet::new(),
        }
    }

    pub fn check_timeout(&self) -> PublicodesResult<()> {
        self.timeout.check_timeout(self.limits)
    }

    /// Cached result of `name`; the inputs it missed are recorded again
    pub fn cached(&mut self, name: &str) -> Option<OperationResult> {
        let (result, missing) = self.cache.get(name)?;
        self.missing.extend(missing.iter().cloned());
        Some(result.clone())
    }

    pub fn store(&mut self, name: &str, result: OperationResult, missing: BTreeSet<String>) {
        self.cache.insert(name.to_string(), (result, missing));
    }

    /// Mark `name` as being evaluated, failing if it already is
    pub fn enter(&mut self, name: &str) -> PublicodesResult<()> {
        if let Some(start) = self.stack.iter().position(|other| other == name) {
            let mut cycle: Vec<&str> = self.stack[start..].iter().map(String::as_str).collect();
            cycle.push(name);
            return Err(PublicodesError::CircularDependency(cycle.join(" -> ")));
        }
        self.stack.push(name.to_string());
        Ok(())
    }

    pub fn leave(&mut self) {
        self.stack.pop();
    }

    /// Start checking the applicability of `name`; false if already in progress
    pub fn begin_applicability_check(&mut self, name: &str) -> bool {
        self.checking_applicability.insert(name.to_string())
    }

    pub fn end_applicability_check(&mut self, name: &str) {
        self.checking_applicability.remove(name);
    }

    pub fn situation_value(&self, name: &str) -> Option<&'a Expression> {
        self.situation.get(name)
    }
}
