//! Expression evaluation
//!
//! Recursively evaluates expressions to produce operation results. Absent
//! operands (missing or not applicable) make the whole operation absent.

use super::context::EvaluationContext;
use super::mechanisms;
use super::operations::{arithmetic_operation, comparison_operation};
use super::rules::evaluate_rule;
use crate::semantic::{Expression, ExpressionKind, LiteralValue};
use crate::{OperationResult, PublicodesError, PublicodesResult};

/// Evaluate an expression to produce an operation result
pub fn evaluate_expression(
    expr: &Expression,
    context: &mut EvaluationContext,
) -> PublicodesResult<OperationResult> {
    // Check timeout at the start of every expression evaluation
    context.check_timeout()?;

    match &expr.kind {
        ExpressionKind::Literal(value, unit) => {
            Ok(OperationResult::Value(value.clone(), unit.clone()))
        }

        ExpressionKind::Reference(reference) => evaluate_rule(&reference.name, context),

        ExpressionKind::Arithmetic(left, op, right) => {
            let left = evaluate_expression(left, context)?;
            let right = evaluate_expression(right, context)?;
            if let Some(absent) = OperationResult::absent(&left, &right) {
                return Ok(absent);
            }
            match (&left, &right) {
                (OperationResult::Value(l, l_unit), OperationResult::Value(r, r_unit)) => {
                    arithmetic_operation((l, l_unit.as_ref()), *op, (r, r_unit.as_ref()))
                }
                _ => Ok(OperationResult::Missing),
            }
        }

        ExpressionKind::Comparison(left, op, right) => {
            let left = evaluate_expression(left, context)?;
            let right = evaluate_expression(right, context)?;
            if let Some(absent) = OperationResult::absent(&left, &right) {
                return Ok(absent);
            }
            match (&left, &right) {
                (OperationResult::Value(l, l_unit), OperationResult::Value(r, r_unit)) => {
                    let result =
                        comparison_operation((l, l_unit.as_ref()), *op, (r, r_unit.as_ref()))?;
                    Ok(OperationResult::boolean(result))
                }
                _ => Ok(OperationResult::Missing),
            }
        }

        ExpressionKind::Negation(inner) => match evaluate_expression(inner, context)? {
            OperationResult::Value(LiteralValue::Number(n), unit) => {
                Ok(OperationResult::number(-n, unit))
            }
            OperationResult::Value(other, _) => Err(PublicodesError::Runtime(format!(
                "Cannot negate {} {}",
                other.type_name(),
                other
            ))),
            absent => Ok(absent),
        },

        ExpressionKind::Sum(terms) => mechanisms::sum(terms, context),
        ExpressionKind::Product(factors) => mechanisms::product(factors, context),
        ExpressionKind::AllOf(conditions) => mechanisms::all_of(conditions, context),
        ExpressionKind::AnyOf(conditions) => mechanisms::any_of(conditions, context),
        ExpressionKind::Variations(branches, otherwise) => {
            mechanisms::variations(branches, otherwise.as_deref(), context)
        }
        ExpressionKind::Scale(scale) => mechanisms::scale(scale, context),
        ExpressionKind::Ceiling(value, bound) => mechanisms::bound(value, bound, true, context),
        ExpressionKind::Floor(value, bound) => mechanisms::bound(value, bound, false, context),
        ExpressionKind::Rounding(value, decimals) => mechanisms::rounding(value, decimals, context),
        ExpressionKind::UnitConversion(inner, unit) => {
            mechanisms::unit_conversion(inner, unit, context)
        }
        ExpressionKind::ApplicableIf(condition, value) => {
            mechanisms::applicable_if(condition, value, context)
        }
        ExpressionKind::NotApplicableIf(condition, value) => {
            mechanisms::not_applicable_if(condition, value, context)
        }
        ExpressionKind::Predicate(kind, inner) => mechanisms::predicate(*kind, inner, context),
    }
}
