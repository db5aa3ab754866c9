//! Rule evaluation
//!
//! A rule is evaluated in this order:
//! 1. Applicability of the enclosing namespaces
//! 2. Its own `applicable si` / `non applicable si`
//! 3. The situation entry, or else its value
//! 4. `par défaut` when the value is missing
//! 5. Conversion to the declared `unité`

use super::context::EvaluationContext;
use super::expression::evaluate_expression;
use super::mechanisms::condition;
use super::units;
use crate::semantic::{LiteralValue, RuleDefinition};
use crate::{OperationResult, PublicodesError, PublicodesResult};
use tracing::trace;

/// Evaluate the rule `name`, using the per-call cache
pub fn evaluate_rule(
    name: &str,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    context.traversed.insert(name.to_string());
    if let Some(cached) = context.cached(name) {
        return Ok(cached);
    }

    let rules = context.rules;
    let rule = rules
        .get(name)
        .ok_or_else(|| PublicodesError::UnknownRule(name.to_string()))?;

    context.enter(name)?;
    // Collect this rule's missing inputs on their own so the cache can replay them
    let outer_missing = std::mem::take(&mut context.missing);
    let result = compute_rule(rule, context);
    let own_missing = std::mem::replace(&mut context.missing, outer_missing);
    context.missing.extend(own_missing.iter().cloned());
    context.leave();
    let result = result?;

    trace!(rule = name, result = ?result, "rule evaluated");
    context.store(name, result.clone(), own_missing);
    Ok(result)
}

fn compute_rule(
    rule: &RuleDefinition,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    if let Some(absent) = ancestors_applicability(rule, context)? {
        return Ok(absent);
    }
    if let Some(absent) = own_applicability(rule, context)? {
        return Ok(absent);
    }

    let missing_before = context.missing.clone();
    let mut result = rule_value(rule, context)?;

    if result.is_missing() {
        if let Some(default) = &rule.default {
            context.missing = missing_before;
            result = evaluate_expression(default, context)?;
        }
    }

    apply_declared_unit(rule, result)
}

/// The situation entry if there is one, else the rule's own value
fn rule_value(
    rule: &RuleDefinition,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    if let Some(situation_value) = context.situation_value(&rule.name) {
        return evaluate_expression(situation_value, context);
    }

    match &rule.value {
        Some(value) => evaluate_expression(value, context),
        // A namespace without value is a plain `oui`
        None if context.rules.has_children(&rule.name) => Ok(OperationResult::boolean(true)),
        None => {
            if rule.default.is_none() {
                context.missing.insert(rule.name.clone());
            }
            Ok(OperationResult::Missing)
        }
    }
}

/// `Some(absent)` when the rule's own conditions make it absent
fn own_applicability(
    rule: &RuleDefinition,
    context: &mut EvaluationContext,
) -> PublicodesResult<Option<OperationResult>> {
    if let Some(applicable_if) = &rule.applicable_if {
        match condition(applicable_if, context, "applicable si")? {
            Some(true) => {}
            Some(false) => return Ok(Some(OperationResult::NotApplicable)),
            None => return Ok(Some(OperationResult::Missing)),
        }
    }
    if let Some(not_applicable_if) = &rule.not_applicable_if {
        match condition(not_applicable_if, context, "non applicable si")? {
            Some(true) => return Ok(Some(OperationResult::NotApplicable)),
            Some(false) => {}
            None => return Ok(Some(OperationResult::Missing)),
        }
    }
    Ok(None)
}

/// A rule does not apply when one of its enclosing namespaces does not
///
/// A namespace is checked through its conditions and its situation entry,
/// never through its value, since that value commonly depends on the very
/// rules being checked. A namespace already being checked, or whose
/// conditions lead back to a rule being evaluated, is skipped.
fn ancestors_applicability(
    rule: &RuleDefinition,
    context: &mut EvaluationContext,
) -> PublicodesResult<Option<OperationResult>> {
    let rules = context.rules;
    let mut ancestors: Vec<&RuleDefinition> = rules.ancestors(&rule.name).collect();
    ancestors.reverse();

    let mut missing = false;
    for ancestor in ancestors {
        if !context.begin_applicability_check(&ancestor.name) {
            continue;
        }
        let result = ancestor_applicability(ancestor, context);
        context.end_applicability_check(&ancestor.name);

        match result {
            Ok(Some(OperationResult::Missing)) => missing = true,
            Ok(Some(absent)) => return Ok(Some(absent)),
            Ok(None) => {}
            // The namespace's conditions depend on the rule being evaluated
            Err(PublicodesError::CircularDependency(cycle)) => {
                trace!(namespace = %ancestor.name, %cycle, "namespace applicability skipped");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(missing.then_some(OperationResult::Missing))
}

fn ancestor_applicability(
    ancestor: &RuleDefinition,
    context: &mut EvaluationContext,
) -> PublicodesResult<Option<OperationResult>> {
    if let Some(absent) = own_applicability(ancestor, context)? {
        return Ok(Some(absent));
    }
    if let Some(situation_value) = context.situation_value(&ancestor.name) {
        context.traversed.insert(ancestor.name.clone());
        match evaluate_expression(situation_value, context)? {
            OperationResult::Value(LiteralValue::Boolean(false), _)
            | OperationResult::NotApplicable => return Ok(Some(OperationResult::NotApplicable)),
            _ => {}
        }
    }
    Ok(None)
}

fn apply_declared_unit(
    rule: &RuleDefinition,
    result: OperationResult,
) -> PublicodesResult<OperationResult> {
    let Some(declared) = &rule.unit else {
        return Ok(result);
    };
    match result {
        OperationResult::Value(LiteralValue::Number(n), unit) => {
            if let Some(from) = &unit {
                if !units::are_compatible(from, declared) {
                    return Err(PublicodesError::Runtime(format!(
                        "Rule '{}' has unit '{}', but its value is in '{}'",
                        rule.name, declared, from
                    )));
                }
            }
            let converted = units::convert(n, unit.as_ref(), Some(declared))?;
            Ok(OperationResult::number(converted, Some(declared.clone())))
        }
        other => Ok(other),
    }
}
