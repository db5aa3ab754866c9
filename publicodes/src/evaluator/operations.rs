//! Unit-aware arithmetic and comparison operations
//!
//! Operands arrive as values with optional units. Sums and comparisons bring
//! the right operand into the left operand's unit; products and quotients
//! combine units.

use super::units;
use crate::semantic::{ArithmeticOperation, ComparisonOperator, LiteralValue, Unit};
use crate::{OperationResult, PublicodesError, PublicodesResult};
use rust_decimal::Decimal;

/// Perform an arithmetic operation between two present values
pub fn arithmetic_operation(
    left: (&LiteralValue, Option<&Unit>),
    op: ArithmeticOperation,
    right: (&LiteralValue, Option<&Unit>),
) -> PublicodesResult<OperationResult> {
    let (l, l_unit) = number_operand(left, op)?;
    let (r, r_unit) = number_operand(right, op)?;

    match op {
        ArithmeticOperation::Add | ArithmeticOperation::Subtract => {
            let (r, unit) = align(r, r_unit, l_unit, op)?;
            let value = match op {
                ArithmeticOperation::Add => l.checked_add(r),
                _ => l.checked_sub(r),
            }
            .ok_or_else(|| overflow(op))?;
            Ok(OperationResult::number(value, unit.cloned()))
        }
        ArithmeticOperation::Multiply => {
            let (ratio, unit) = units::multiply(l_unit, r_unit)?;
            let value = l.checked_mul(r).ok_or_else(|| overflow(op))?;
            Ok(OperationResult::number(ratio.apply(value)?, unit))
        }
        ArithmeticOperation::Divide => {
            if r.is_zero() {
                return Err(PublicodesError::Runtime(format!(
                    "Division by zero: {} / {}",
                    l.normalize(),
                    r
                )));
            }
            let (ratio, unit) = units::divide(l_unit, r_unit)?;
            let value = l.checked_div(r).ok_or_else(|| overflow(op))?;
            Ok(OperationResult::number(ratio.apply(value)?, unit))
        }
    }
}

/// Compare two present values
///
/// Numbers compare after unit conversion. Booleans and text only support
/// equality.
pub fn comparison_operation(
    left: (&LiteralValue, Option<&Unit>),
    op: ComparisonOperator,
    right: (&LiteralValue, Option<&Unit>),
) -> PublicodesResult<bool> {
    match (left.0, right.0) {
        (LiteralValue::Number(l), LiteralValue::Number(r)) => {
            if let (Some(from), Some(to)) = (right.1, left.1) {
                if !units::are_compatible(from, to) {
                    return Err(unit_mismatch(left.1, right.1));
                }
            }
            let r = units::convert(*r, right.1, left.1)?;
            Ok(compare_numbers(*l, op, r))
        }
        (l, r) if l.type_name() == r.type_name() => match op {
            ComparisonOperator::Equal => Ok(l == r),
            ComparisonOperator::NotEqual => Ok(l != r),
            _ => Err(PublicodesError::Runtime(format!(
                "Cannot compare {} values with '{}'",
                l.type_name(),
                op.name()
            ))),
        },
        (l, r) => Err(PublicodesError::Runtime(format!(
            "Cannot compare {} {} with {} {}",
            l.type_name(),
            l,
            r.type_name(),
            r
        ))),
    }
}

fn compare_numbers(l: Decimal, op: ComparisonOperator, r: Decimal) -> bool {
    match op {
        ComparisonOperator::GreaterThan => l > r,
        ComparisonOperator::LessThan => l < r,
        ComparisonOperator::GreaterThanOrEqual => l >= r,
        ComparisonOperator::LessThanOrEqual => l <= r,
        ComparisonOperator::Equal => l == r,
        ComparisonOperator::NotEqual => l != r,
    }
}

fn number_operand<'a>(
    (value, unit): (&LiteralValue, Option<&'a Unit>),
    op: ArithmeticOperation,
) -> PublicodesResult<(Decimal, Option<&'a Unit>)> {
    match value {
        LiteralValue::Number(n) => Ok((*n, unit)),
        other => Err(PublicodesError::Runtime(format!(
            "Operand of {} must be a number, but got {} {}",
            op.name(),
            other.type_name(),
            other
        ))),
    }
}

/// Bring the right operand of a sum into the left operand's unit
///
/// The result takes whichever unit is present.
fn align<'a>(
    value: Decimal,
    from: Option<&'a Unit>,
    to: Option<&'a Unit>,
    op: ArithmeticOperation,
) -> PublicodesResult<(Decimal, Option<&'a Unit>)> {
    match (from, to) {
        (Some(from), Some(to)) => {
            if !units::are_compatible(from, to) {
                return Err(PublicodesError::Runtime(format!(
                    "Cannot apply {} to '{}' and '{}'",
                    op.name(),
                    to,
                    from
                )));
            }
            Ok((units::convert(value, Some(from), Some(to))?, Some(to)))
        }
        (from, to) => Ok((value, to.or(from))),
    }
}

fn unit_mismatch(left: Option<&Unit>, right: Option<&Unit>) -> PublicodesError {
    let show = |unit: Option<&Unit>| unit.map_or_else(|| "no unit".to_string(), |u| u.to_string());
    PublicodesError::Runtime(format!(
        "Cannot compare '{}' with '{}'",
        show(left),
        show(right)
    ))
}

fn overflow(op: ArithmeticOperation) -> PublicodesError {
    PublicodesError::Runtime(format!("Numeric overflow in {}", op.name()))
}
