use crate::semantic::{LiteralValue, Unit};
use crate::OperationResult;
use rust_decimal::Decimal;
use serde::Serialize;

/// Why a value is (or is not) present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueStatus {
    Defined,
    NotApplicable,
    Missing,
}

/// Outcome of evaluating one rule or expression under a situation
///
/// `node_value` is `None` both when the rule does not apply and when inputs
/// are missing; `status` and `missing_variables` tell the two apart. A
/// non-applicable rule is never reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// The evaluated target as requested
    pub expression: String,
    /// Full name of the rule when the target is a rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub node_value: Option<LiteralValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    pub status: ValueStatus,
    /// Inputs that had neither a situation entry nor a default, sorted
    pub missing_variables: Vec<String>,
    /// Every rule visited while evaluating, sorted
    pub traversed_variables: Vec<String>,
}

impl Evaluation {
    pub(crate) fn from_result(
        expression: impl Into<String>,
        rule: Option<String>,
        result: OperationResult,
        missing_variables: Vec<String>,
        traversed_variables: Vec<String>,
    ) -> Self {
        let (node_value, unit, status) = match result {
            OperationResult::Value(value, unit) => (Some(value), unit, ValueStatus::Defined),
            OperationResult::NotApplicable => (None, None, ValueStatus::NotApplicable),
            OperationResult::Missing => (None, None, ValueStatus::Missing),
        };
        Self {
            expression: expression.into(),
            rule,
            node_value,
            unit,
            status,
            missing_variables,
            traversed_variables,
        }
    }

    /// The numeric value, if the result is a number
    pub fn number(&self) -> Option<Decimal> {
        self.node_value.as_ref().and_then(LiteralValue::as_number)
    }

    pub fn is_applicable(&self) -> bool {
        self.status != ValueStatus::NotApplicable
    }

    pub fn is_missing(&self) -> bool {
        self.status == ValueStatus::Missing
    }

    /// Value followed by its unit, or `non applicable` / `manquant`
    pub fn display_value(&self) -> String {
        match (&self.node_value, &self.unit) {
            (Some(value), Some(unit)) => format!("{} {}", value, unit),
            (Some(value), None) => value.to_string(),
            (None, _) if self.is_missing() => "manquant".to_string(),
            (None, _) => "non applicable".to_string(),
        }
    }
}
