//! Mechanism parsing
//!
//! A rule value is either a scalar (number, boolean, expression string) or an
//! object of mechanisms. An object holds at most one core mechanism (`valeur`,
//! `somme`, `barème`, ...) plus chainable modifiers (`plafond`, `plancher`,
//! `arrondi`, `unité`, `applicable si`, `non applicable si`) wrapped around it.

use super::literals::parse_decimal;
use super::parse_expression_with_depth;
use super::units::parse_unit;
use crate::ast::{DepthTracker, Span};
use crate::error::PublicodesError;
use crate::semantic::{
    Bracket, Expression, ExpressionKind, LiteralValue, PredicateKind, Scale, Variation,
};
use serde_json::{Map, Value};
use std::sync::Arc;

const CORE_MECHANISMS: &[&str] = &[
    "valeur",
    "somme",
    "produit",
    "barème",
    "variations",
    "toutes ces conditions",
    "une de ces conditions",
    "est applicable",
    "est non applicable",
    "est défini",
    "est non défini",
];

const CHAINABLE_MECHANISMS: &[&str] = &[
    "plancher",
    "plafond",
    "unité",
    "arrondi",
    "non applicable si",
    "applicable si",
];

/// Parses the mechanisms of one rule, tracking nesting depth across calls
pub(crate) struct MechanismParser<'a> {
    rule_name: &'a str,
    depth: &'a mut DepthTracker,
}

impl<'a> MechanismParser<'a> {
    pub(crate) fn new(rule_name: &'a str, depth: &'a mut DepthTracker) -> Self {
        Self { rule_name, depth }
    }

    /// Parse any value that may stand where an expression is expected
    pub(crate) fn parse_node(&mut self, value: &Value) -> Result<Expression, PublicodesError> {
        self.depth.push()?;
        let result = self.parse_node_inner(value);
        self.depth.pop();
        result
    }

    fn parse_node_inner(&mut self, value: &Value) -> Result<Expression, PublicodesError> {
        match value {
            Value::String(text) => {
                parse_expression_with_depth(text, self.rule_name, &mut *self.depth)
            }
            Value::Number(number) => Ok(Expression::literal(
                LiteralValue::Number(parse_decimal(&number.to_string())?),
                None,
            )),
            Value::Bool(boolean) => Ok(Expression::literal(LiteralValue::Boolean(*boolean), None)),
            Value::Object(object) => self.parse_object(object),
            Value::Null => Err(self.error("null", "Expected a value but found null")),
            Value::Array(_) => Err(self.error(
                "[...]",
                "A list is only allowed as the argument of a mechanism such as 'somme'",
            )),
        }
    }

    /// Parse an object of mechanisms into a single expression tree
    pub(crate) fn parse_object(
        &mut self,
        object: &Map<String, Value>,
    ) -> Result<Expression, PublicodesError> {
        if let Some(unknown) = object
            .keys()
            .find(|key| {
                !CORE_MECHANISMS.contains(&key.as_str())
                    && !CHAINABLE_MECHANISMS.contains(&key.as_str())
            })
        {
            return Err(self.error(unknown, format!("Unknown mechanism '{}'", unknown)));
        }

        let cores: Vec<&String> = object
            .keys()
            .filter(|key| CORE_MECHANISMS.contains(&key.as_str()))
            .collect();
        let core_key = match cores.as_slice() {
            [single] => single.as_str(),
            [] => {
                return Err(self.error(
                    "{...}",
                    "A mechanism object needs a 'valeur' (or another core mechanism)",
                ))
            }
            [first, second, ..] => {
                return Err(self.error(
                    second,
                    format!("Mechanisms '{}' and '{}' cannot be combined", first, second),
                ))
            }
        };

        let mut expression = self.parse_core(core_key, &object[core_key])?;

        for key in CHAINABLE_MECHANISMS {
            let Some(argument) = object.get(*key) else {
                continue;
            };
            expression = self.wrap_chainable(key, argument, expression)?;
        }

        Ok(expression)
    }

    fn parse_core(&mut self, key: &str, argument: &Value) -> Result<Expression, PublicodesError> {
        let kind = match key {
            "valeur" => return self.parse_node(argument),
            "somme" => ExpressionKind::Sum(self.parse_list(key, argument)?),
            "produit" => ExpressionKind::Product(self.parse_list(key, argument)?),
            "toutes ces conditions" => ExpressionKind::AllOf(self.parse_list(key, argument)?),
            "une de ces conditions" => ExpressionKind::AnyOf(self.parse_list(key, argument)?),
            "variations" => self.parse_variations(argument)?,
            "barème" => ExpressionKind::Scale(Box::new(self.parse_scale(argument)?)),
            "est applicable" => self.parse_predicate(PredicateKind::IsApplicable, argument)?,
            "est non applicable" => {
                self.parse_predicate(PredicateKind::IsNotApplicable, argument)?
            }
            "est défini" => self.parse_predicate(PredicateKind::IsDefined, argument)?,
            "est non défini" => self.parse_predicate(PredicateKind::IsUndefined, argument)?,
            other => return Err(self.error(other, format!("Unknown mechanism '{}'", other))),
        };
        Ok(Expression::new(kind, None))
    }

    fn wrap_chainable(
        &mut self,
        key: &str,
        argument: &Value,
        inner: Expression,
    ) -> Result<Expression, PublicodesError> {
        let inner = Box::new(inner);
        let kind = match key {
            "plancher" => ExpressionKind::Floor(inner, Box::new(self.parse_node(argument)?)),
            "plafond" => ExpressionKind::Ceiling(inner, Box::new(self.parse_node(argument)?)),
            "arrondi" => ExpressionKind::Rounding(inner, Box::new(self.parse_node(argument)?)),
            "applicable si" => {
                ExpressionKind::ApplicableIf(Box::new(self.parse_node(argument)?), inner)
            }
            "non applicable si" => {
                ExpressionKind::NotApplicableIf(Box::new(self.parse_node(argument)?), inner)
            }
            "unité" => {
                let unit = self.parse_unit_argument(argument)?;
                match unit {
                    Some(unit) => ExpressionKind::UnitConversion(inner, unit),
                    None => return Ok(*inner),
                }
            }
            other => return Err(self.error(other, format!("Unknown mechanism '{}'", other))),
        };
        Ok(Expression::new(kind, None))
    }

    pub(crate) fn parse_unit_argument(
        &mut self,
        argument: &Value,
    ) -> Result<Option<crate::semantic::Unit>, PublicodesError> {
        match argument {
            Value::String(text) => parse_unit(text, self.rule_name),
            _ => Err(self.error("unité", "The 'unité' key expects a string such as '€/an'")),
        }
    }

    fn parse_list(
        &mut self,
        key: &str,
        argument: &Value,
    ) -> Result<Vec<Expression>, PublicodesError> {
        let Value::Array(items) = argument else {
            return Err(self.error(key, format!("'{}' expects a list", key)));
        };
        items.iter().map(|item| self.parse_node(item)).collect()
    }

    fn parse_predicate(
        &mut self,
        kind: PredicateKind,
        argument: &Value,
    ) -> Result<ExpressionKind, PublicodesError> {
        Ok(ExpressionKind::Predicate(
            kind,
            Box::new(self.parse_node(argument)?),
        ))
    }

    fn parse_variations(&mut self, argument: &Value) -> Result<ExpressionKind, PublicodesError> {
        let Value::Array(branches) = argument else {
            return Err(self.error("variations", "'variations' expects a list of branches"));
        };

        let mut variations = Vec::new();
        let mut otherwise = None;

        for (index, branch) in branches.iter().enumerate() {
            let Value::Object(branch) = branch else {
                return Err(self.error(
                    "variations",
                    "Each branch of 'variations' is an object with 'si'/'alors' or 'sinon'",
                ));
            };

            if let Some(fallback) = branch.get("sinon") {
                if index != branches.len() - 1 {
                    return Err(self.error("sinon", "'sinon' must be the last branch"));
                }
                otherwise = Some(Box::new(self.parse_node(fallback)?));
                continue;
            }

            let (Some(condition), Some(consequence)) = (branch.get("si"), branch.get("alors"))
            else {
                return Err(self.error(
                    "variations",
                    "A branch of 'variations' needs both 'si' and 'alors'",
                ));
            };
            variations.push(Variation {
                condition: self.parse_node(condition)?,
                consequence: self.parse_node(consequence)?,
            });
        }

        if variations.is_empty() {
            return Err(self.error("variations", "'variations' needs at least one 'si' branch"));
        }

        Ok(ExpressionKind::Variations(variations, otherwise))
    }

    fn parse_scale(&mut self, argument: &Value) -> Result<Scale, PublicodesError> {
        let Value::Object(scale) = argument else {
            return Err(self.error("barème", "'barème' expects an object"));
        };

        if let Some(unknown) = scale
            .keys()
            .find(|key| !["assiette", "multiplicateur", "tranches"].contains(&key.as_str()))
        {
            return Err(self.error(unknown, format!("Unknown key '{}' in 'barème'", unknown)));
        }

        let base = scale
            .get("assiette")
            .ok_or_else(|| self.error("barème", "'barème' needs an 'assiette'"))?;
        let base = self.parse_node(base)?;

        let multiplier = scale
            .get("multiplicateur")
            .map(|multiplier| self.parse_node(multiplier))
            .transpose()?;

        let Some(Value::Array(tranches)) = scale.get("tranches") else {
            return Err(self.error("barème", "'barème' needs a list of 'tranches'"));
        };
        if tranches.is_empty() {
            return Err(self.error("tranches", "'tranches' cannot be empty"));
        }

        let mut brackets = Vec::with_capacity(tranches.len());
        for (index, tranche) in tranches.iter().enumerate() {
            let Value::Object(tranche) = tranche else {
                return Err(self.error("tranches", "Each tranche is an object with 'taux'"));
            };
            let rate = tranche
                .get("taux")
                .ok_or_else(|| self.error("tranches", "Each tranche needs a 'taux'"))?;
            let rate = self.parse_node(rate)?;
            let ceiling = tranche
                .get("plafond")
                .map(|ceiling| self.parse_node(ceiling))
                .transpose()?;
            if ceiling.is_none() && index != tranches.len() - 1 {
                return Err(self.error(
                    "tranches",
                    "Only the last tranche may omit its 'plafond'",
                ));
            }
            brackets.push(Bracket { rate, ceiling });
        }

        Ok(Scale {
            base,
            multiplier,
            brackets,
        })
    }

    /// Mechanism errors point at the offending key
    pub(crate) fn error(&self, key: &str, message: impl Into<String>) -> PublicodesError {
        PublicodesError::parse(
            message,
            Span {
                start: 0,
                end: key.len(),
                line: 1,
                col: 1,
            },
            self.rule_name,
            Arc::from(key),
        )
    }
}
