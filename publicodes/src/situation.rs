//! Situations: the input values bound to rules for an evaluation
//!
//! A situation maps rule names to values. Values are numbers, booleans or
//! expression strings written in the rule grammar (`"230000 €/an"`,
//! `"40 %"`, `"oui"`, `"2 * autre règle"`), or quantities given as a
//! magnitude and a unit.

use crate::parser::{parse_expression, parse_unit, rules::normalize_rule_name};
use crate::semantic::{Expression, LiteralValue};
use crate::validator::resolve_references;
use crate::{PublicodesError, PublicodesResult, ResourceLimits, RuleSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A value bound to a rule by a situation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SituationValue {
    Number(Decimal),
    Boolean(bool),
    Quantity { magnitude: Decimal, unit: String },
    Expression(String),
}

impl SituationValue {
    pub fn quantity(magnitude: impl Into<Decimal>, unit: impl Into<String>) -> Self {
        SituationValue::Quantity {
            magnitude: magnitude.into(),
            unit: unit.into(),
        }
    }
}

impl From<Decimal> for SituationValue {
    fn from(value: Decimal) -> Self {
        SituationValue::Number(value)
    }
}

impl From<i64> for SituationValue {
    fn from(value: i64) -> Self {
        SituationValue::Number(Decimal::from(value))
    }
}

impl From<i32> for SituationValue {
    fn from(value: i32) -> Self {
        SituationValue::Number(Decimal::from(value))
    }
}

impl From<bool> for SituationValue {
    fn from(value: bool) -> Self {
        SituationValue::Boolean(value)
    }
}

impl From<&str> for SituationValue {
    fn from(value: &str) -> Self {
        SituationValue::Expression(value.to_string())
    }
}

impl From<String> for SituationValue {
    fn from(value: String) -> Self {
        SituationValue::Expression(value)
    }
}

/// Rule names bound to input values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Situation {
    values: BTreeMap<String, SituationValue>,
}

impl Situation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion
    pub fn with(mut self, rule: impl Into<String>, value: impl Into<SituationValue>) -> Self {
        self.insert(rule, value);
        self
    }

    pub fn insert(&mut self, rule: impl Into<String>, value: impl Into<SituationValue>) {
        self.values.insert(rule.into(), value.into());
    }

    pub fn get(&self, rule: &str) -> Option<&SituationValue> {
        self.values.get(rule)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SituationValue)> {
        self.values.iter().map(|(rule, value)| (rule.as_str(), value))
    }

    /// Add the entries of `other`, replacing those already present
    pub fn merge(&mut self, other: Situation) {
        self.values.extend(other.values);
    }
}

impl<K, V> FromIterator<(K, V)> for Situation
where
    K: Into<String>,
    V: Into<SituationValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut situation = Situation::new();
        for (rule, value) in iter {
            situation.insert(rule, value);
        }
        situation
    }
}

/// How a new situation combines with the current one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SituationOptions {
    /// Merge into the current situation instead of replacing it
    pub keep_previous_situation: bool,
}

/// Parse and resolve every entry of a situation against a rule set
///
/// All errors are collected. Each key must name a rule; expression values
/// resolve references from the namespace of the rule they are bound to.
pub(crate) fn parse_situation(
    situation: &Situation,
    rules: &RuleSet,
    limits: &ResourceLimits,
) -> PublicodesResult<HashMap<String, Expression>> {
    let names: HashSet<String> = rules.rule_names().into_iter().map(str::to_string).collect();
    let mut parsed = HashMap::with_capacity(situation.len());
    let mut errors = Vec::new();

    for (key, value) in situation.iter() {
        match parse_entry(key, value, rules, &names, limits) {
            Ok((name, expr)) => {
                parsed.insert(name, expr);
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(PublicodesError::from_many(errors))
    }
}

fn parse_entry(
    key: &str,
    value: &SituationValue,
    rules: &RuleSet,
    names: &HashSet<String>,
    limits: &ResourceLimits,
) -> PublicodesResult<(String, Expression)> {
    let name = normalize_rule_name(key)
        .map_err(|_| PublicodesError::situation(key, "Invalid rule name"))?;
    if !rules.contains(&name) {
        return Err(PublicodesError::situation(
            key,
            "No rule with this name exists in the rule set",
        ));
    }

    let expr = match value {
        SituationValue::Number(n) => Expression::literal(LiteralValue::Number(*n), None),
        SituationValue::Boolean(b) => Expression::literal(LiteralValue::Boolean(*b), None),
        SituationValue::Quantity { magnitude, unit } => {
            let unit = parse_unit(unit, &name)
                .map_err(|e| PublicodesError::situation(key, e.to_string()))?;
            Expression::literal(LiteralValue::Number(*magnitude), unit)
        }
        SituationValue::Expression(text) => {
            if text.len() > limits.max_situation_value_bytes {
                return Err(PublicodesError::ResourceLimitExceeded {
                    limit_name: "max_situation_value_bytes".to_string(),
                    limit_value: limits.max_situation_value_bytes.to_string(),
                    actual_value: text.len().to_string(),
                    suggestion: format!("Shorten the situation value for '{}'", name),
                });
            }
            let mut expr = parse_expression(text, &name, limits)?;
            resolve_references(&mut expr, &name, names)?;
            expr
        }
    };

    Ok((name, expr))
}
