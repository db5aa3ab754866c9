//! Evaluation of rules and expressions against a situation
//!
//! Every call builds a fresh context: results are cached per call and the
//! situation is only read, so repeated calls give the same evaluation.

pub mod context;
pub mod expression;
pub mod mechanisms;
pub mod operations;
pub mod rules;
pub mod timeout;
pub mod units;

use crate::semantic::Expression;
use crate::{Evaluation, PublicodesResult, ResourceLimits, RuleSet};
use context::EvaluationContext;
use std::collections::HashMap;

/// What an evaluation targets
pub enum Target<'t> {
    /// A rule, by full name
    Rule(&'t str),
    /// An expression whose references are already resolved
    Expression(&'t Expression),
}

/// Evaluates targets over a rule set and a parsed situation
pub struct Evaluator<'a> {
    rules: &'a RuleSet,
    situation: &'a HashMap<String, Expression>,
    limits: &'a ResourceLimits,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        rules: &'a RuleSet,
        situation: &'a HashMap<String, Expression>,
        limits: &'a ResourceLimits,
    ) -> Self {
        Self {
            rules,
            situation,
            limits,
        }
    }

    /// Evaluate a target; `label` is reported as the evaluated expression
    pub fn evaluate(&self, label: &str, target: Target) -> PublicodesResult<Evaluation> {
        let mut context = EvaluationContext::new(self.rules, self.situation, self.limits);

        let (rule, result) = match target {
            Target::Rule(name) => (
                Some(name.to_string()),
                rules::evaluate_rule(name, &mut context)?,
            ),
            Target::Expression(expr) => (None, expression::evaluate_expression(expr, &mut context)?),
        };

        Ok(Evaluation::from_result(
            label,
            rule,
            result,
            context.missing.into_iter().collect(),
            context.traversed.into_iter().collect(),
        ))
    }
}
