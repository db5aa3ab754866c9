use crate::semantic::{LiteralValue, Unit};
use crate::PublicodesError;
use rust_decimal::Decimal;

/// Result of evaluating a rule or expression
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// A value, with its unit when it is a quantity
    Value(LiteralValue, Option<Unit>),
    /// The rule does not apply (valid result, no value)
    NotApplicable,
    /// An input needed to decide is not in the situation
    Missing,
}

impl OperationResult {
    pub fn number(value: Decimal, unit: Option<Unit>) -> Self {
        OperationResult::Value(LiteralValue::Number(value), unit)
    }

    pub fn boolean(value: bool) -> Self {
        OperationResult::Value(LiteralValue::Boolean(value), None)
    }

    /// Get the value if present, None if not applicable or missing
    pub fn value(&self) -> Option<&LiteralValue> {
        match self {
            OperationResult::Value(value, _) => Some(value),
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<&Unit> {
        match self {
            OperationResult::Value(_, unit) => unit.as_ref(),
            _ => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, OperationResult::NotApplicable)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, OperationResult::Missing)
    }

    /// Combine the absence of two operands: a missing input wins over non-applicability
    pub fn absent(left: &OperationResult, right: &OperationResult) -> Option<OperationResult> {
        if left.is_missing() || right.is_missing() {
            Some(OperationResult::Missing)
        } else if !left.is_applicable() || !right.is_applicable() {
            Some(OperationResult::NotApplicable)
        } else {
            None
        }
    }

    /// Get the number or return an error naming what was expected
    pub fn expect_number(&self, context: &str) -> Result<(Decimal, Option<&Unit>), PublicodesError> {
        match self {
            OperationResult::Value(LiteralValue::Number(n), unit) => Ok((*n, unit.as_ref())),
            OperationResult::Value(other, _) => Err(PublicodesError::Runtime(format!(
                "Expected a number in {}, but got {} {}",
                context,
                other.type_name(),
                other
            ))),
            _ => Err(PublicodesError::Runtime(format!(
                "Expected a number in {}, but got no value",
                context
            ))),
        }
    }

    /// Read a condition: `Some(bool)` for a value, `None` when absent
    pub fn expect_condition(&self, context: &str) -> Result<Option<bool>, PublicodesError> {
        match self {
            OperationResult::Value(LiteralValue::Boolean(b), _) => Ok(Some(*b)),
            OperationResult::Value(other, _) => Err(PublicodesError::Runtime(format!(
                "Condition in {} must be a boolean, but got {} {}",
                context,
                other.type_name(),
                other
            ))),
            _ => Ok(None),
        }
    }
}
