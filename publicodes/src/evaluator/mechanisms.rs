//! Mechanism evaluation
//!
//! Conditions read `NotApplicable` as false. A missing condition makes the
//! mechanism missing unless the other conditions already decide it.

use super::context::EvaluationContext;
use super::expression::evaluate_expression;
use super::operations::arithmetic_operation;
use super::units;
use crate::semantic::{
    ArithmeticOperation, Expression, LiteralValue, PredicateKind, Scale, Unit, Variation,
};
use crate::{OperationResult, PublicodesError, PublicodesResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Evaluate a condition: `None` when an input is missing
pub(super) fn condition(
    expr: &Expression,
    context: &mut EvaluationContext,
    mechanism: &str,
) -> PublicodesResult<Option<bool>> {
    let result = evaluate_expression(expr, context)?;
    if result.is_missing() {
        return Ok(None);
    }
    Ok(Some(result.expect_condition(mechanism)?.unwrap_or(false)))
}

/// `somme`: not applicable terms are skipped
pub fn sum(terms: &[Expression], context: &mut EvaluationContext) -> PublicodesResult<OperationResult> {
    let mut total: Option<(LiteralValue, Option<Unit>)> = None;
    let mut missing = false;

    for term in terms {
        match evaluate_expression(term, context)? {
            OperationResult::Value(value, unit) => {
                total = Some(match total {
                    None => (value, unit),
                    Some((acc, acc_unit)) => {
                        match arithmetic_operation(
                            (&acc, acc_unit.as_ref()),
                            ArithmeticOperation::Add,
                            (&value, unit.as_ref()),
                        )? {
                            OperationResult::Value(value, unit) => (value, unit),
                            absent => return Ok(absent),
                        }
                    }
                });
            }
            OperationResult::NotApplicable => {}
            OperationResult::Missing => missing = true,
        }
    }

    if missing {
        return Ok(OperationResult::Missing);
    }
    Ok(match total {
        Some((value, unit)) => OperationResult::Value(value, unit),
        None => OperationResult::number(Decimal::ZERO, None),
    })
}

/// `produit`: any absent factor makes the product absent
pub fn product(
    factors: &[Expression],
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    let results = factors
        .iter()
        .map(|factor| evaluate_expression(factor, context))
        .collect::<PublicodesResult<Vec<_>>>()?;

    if results.iter().any(OperationResult::is_missing) {
        return Ok(OperationResult::Missing);
    }
    if results.iter().any(|result| !result.is_applicable()) {
        return Ok(OperationResult::NotApplicable);
    }

    let mut total: (LiteralValue, Option<Unit>) = (LiteralValue::Number(Decimal::ONE), None);
    for result in results {
        if let OperationResult::Value(value, unit) = result {
            total = match arithmetic_operation(
                (&total.0, total.1.as_ref()),
                ArithmeticOperation::Multiply,
                (&value, unit.as_ref()),
            )? {
                OperationResult::Value(value, unit) => (value, unit),
                absent => return Ok(absent),
            };
        }
    }
    Ok(OperationResult::Value(total.0, total.1))
}

/// `toutes ces conditions`
pub fn all_of(
    conditions: &[Expression],
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    let mut missing = false;
    for expr in conditions {
        match condition(expr, context, "toutes ces conditions")? {
            Some(false) => return Ok(OperationResult::boolean(false)),
            Some(true) => {}
            None => missing = true,
        }
    }
    Ok(if missing {
        OperationResult::Missing
    } else {
        OperationResult::boolean(true)
    })
}

/// `une de ces conditions`
pub fn any_of(
    conditions: &[Expression],
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    let mut missing = false;
    for expr in conditions {
        match condition(expr, context, "une de ces conditions")? {
            Some(true) => return Ok(OperationResult::boolean(true)),
            Some(false) => {}
            None => missing = true,
        }
    }
    Ok(if missing {
        OperationResult::Missing
    } else {
        OperationResult::boolean(false)
    })
}

/// `variations`: the first branch whose condition holds gives the value
pub fn variations(
    branches: &[Variation],
    otherwise: Option<&Expression>,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    for branch in branches {
        match condition(&branch.condition, context, "variations")? {
            Some(true) => return evaluate_expression(&branch.consequence, context),
            Some(false) => {}
            None => return Ok(OperationResult::Missing),
        }
    }
    match otherwise {
        Some(expr) => evaluate_expression(expr, context),
        None => Ok(OperationResult::NotApplicable),
    }
}

/// `barème`: marginal rates over `assiette / multiplicateur`
pub fn scale(scale: &Scale, context: &mut EvaluationContext) -> PublicodesResult<OperationResult> {
    let base = evaluate_expression(&scale.base, context)?;
    let multiplier = match &scale.multiplier {
        Some(expr) => evaluate_expression(expr, context)?,
        None => OperationResult::number(Decimal::ONE, None),
    };
    if let Some(absent) = OperationResult::absent(&base, &multiplier) {
        return Ok(absent);
    }

    let (base_value, base_unit) = base.expect_number("barème assiette")?;
    let (multiplier_value, multiplier_unit) = multiplier.expect_number("barème multiplicateur")?;
    if multiplier_value.is_zero() {
        return Err(PublicodesError::Runtime(
            "Division by zero: barème multiplicateur is 0".to_string(),
        ));
    }
    let (ratio, bracket_unit) = units::divide(base_unit, multiplier_unit)?;
    let amount = ratio.apply(
        base_value
            .checked_div(multiplier_value)
            .ok_or_else(scale_overflow)?,
    )?;

    let mut total = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    for (index, bracket) in scale.brackets.iter().enumerate() {
        if amount <= lower {
            break;
        }

        let rate = evaluate_expression(&bracket.rate, context)?;
        if !rate.is_applicable() || rate.is_missing() {
            return Ok(rate);
        }
        let (rate_value, _) = rate.expect_number("barème taux")?;

        let upper = match &bracket.ceiling {
            Some(expr) => {
                let ceiling = evaluate_expression(expr, context)?;
                if !ceiling.is_applicable() || ceiling.is_missing() {
                    return Ok(ceiling);
                }
                let (value, unit) = ceiling.expect_number("barème plafond")?;
                let value = units::convert(value, unit, bracket_unit.as_ref())?;
                if value < lower {
                    return Err(PublicodesError::Runtime(format!(
                        "Ceiling of bracket {} ({}) is below the previous one ({})",
                        index + 1,
                        value.normalize(),
                        lower.normalize()
                    )));
                }
                Some(value)
            }
            None => None,
        };

        let taxed = upper.map_or(amount, |upper| amount.min(upper)) - lower;
        total = taxed
            .checked_mul(rate_value)
            .and_then(|bracket_total| total.checked_add(bracket_total))
            .ok_or_else(scale_overflow)?;
        match upper {
            Some(upper) => lower = upper,
            None => break,
        }
    }

    Ok(OperationResult::number(
        total
            .checked_mul(multiplier_value)
            .ok_or_else(scale_overflow)?,
        base_unit.cloned(),
    ))
}

fn scale_overflow() -> PublicodesError {
    PublicodesError::Runtime("Numeric overflow in barème".to_string())
}

/// `plafond` (`is_ceiling`) and `plancher`; an absent bound leaves the value unchanged
pub fn bound(
    value: &Expression,
    bound: &Expression,
    is_ceiling: bool,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    let mechanism = if is_ceiling { "plafond" } else { "plancher" };
    let result = evaluate_expression(value, context)?;
    let (number, unit) = match &result {
        OperationResult::Value(..) => result.expect_number(mechanism)?,
        _ => return Ok(result),
    };

    let limit = evaluate_expression(bound, context)?;
    let (limit_number, limit_unit) = match &limit {
        OperationResult::Value(..) => limit.expect_number(mechanism)?,
        _ => return Ok(result.clone()),
    };
    let limit_number = units::convert(limit_number, limit_unit, unit)?;

    let bounded = if is_ceiling {
        number.min(limit_number)
    } else {
        number.max(limit_number)
    };
    Ok(OperationResult::number(bounded, unit.cloned()))
}

/// `arrondi`: `oui` rounds to an integer, a number gives the decimals to keep
pub fn rounding(
    value: &Expression,
    decimals: &Expression,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    let result = evaluate_expression(value, context)?;
    let (number, unit) = match &result {
        OperationResult::Value(..) => result.expect_number("arrondi")?,
        _ => return Ok(result),
    };

    let places = match evaluate_expression(decimals, context)? {
        OperationResult::Value(LiteralValue::Boolean(true), _) => 0,
        OperationResult::Value(LiteralValue::Boolean(false), _) => return Ok(result.clone()),
        OperationResult::Value(LiteralValue::Number(n), _) => n.to_u32().ok_or_else(|| {
            PublicodesError::Runtime(format!("Invalid number of decimals in arrondi: {}", n))
        })?,
        OperationResult::Value(other, _) => {
            return Err(PublicodesError::Runtime(format!(
                "arrondi expects oui, non or a number of decimals, but got {} {}",
                other.type_name(),
                other
            )))
        }
        absent => return Ok(absent),
    };

    let rounded = number.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    Ok(OperationResult::number(rounded, unit.cloned()))
}

/// `unité` inside a mechanism
pub fn unit_conversion(
    inner: &Expression,
    target: &Unit,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    match evaluate_expression(inner, context)? {
        OperationResult::Value(LiteralValue::Number(n), unit) => {
            let converted = units::convert(n, unit.as_ref(), Some(target))?;
            Ok(OperationResult::number(converted, Some(target.clone())))
        }
        other => Ok(other),
    }
}

/// `applicable si` inside a mechanism
pub fn applicable_if(
    condition_expr: &Expression,
    value: &Expression,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    match condition(condition_expr, context, "applicable si")? {
        Some(true) => evaluate_expression(value, context),
        Some(false) => Ok(OperationResult::NotApplicable),
        None => Ok(OperationResult::Missing),
    }
}

/// `non applicable si` inside a mechanism
pub fn not_applicable_if(
    condition_expr: &Expression,
    value: &Expression,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    match condition(condition_expr, context, "non applicable si")? {
        Some(true) => Ok(OperationResult::NotApplicable),
        Some(false) => evaluate_expression(value, context),
        None => Ok(OperationResult::Missing),
    }
}

/// `est applicable`, `est non applicable`, `est défini`, `est non défini`
pub fn predicate(
    kind: PredicateKind,
    inner: &Expression,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    let missing_before = context.missing.clone();
    let result = evaluate_expression(inner, context)?;

    let answer = match kind {
        PredicateKind::IsApplicable | PredicateKind::IsNotApplicable => {
            if result.is_missing() {
                return Ok(OperationResult::Missing);
            }
            result.is_applicable() == (kind == PredicateKind::IsApplicable)
        }
        PredicateKind::IsDefined | PredicateKind::IsUndefined => {
            // Asking whether a value is defined answers the question for it
            context.missing = missing_before;
            result.is_missing() == (kind == PredicateKind::IsUndefined)
        }
    };
    Ok(OperationResult::boolean(answer))
}
