use super::units::unit_from_str;
use super::Rule;
use crate::error::PublicodesError;
use crate::semantic::{LiteralValue, Unit};

use pest::iterators::Pair;
use rust_decimal::Decimal;
use std::str::FromStr;

pub(crate) fn parse_literal(
    pair: Pair<Rule>,
) -> Result<(LiteralValue, Option<Unit>), PublicodesError> {
    match pair.as_rule() {
        Rule::number_literal => Ok((LiteralValue::Number(parse_inner_number(pair)?), None)),
        Rule::percentage_literal => parse_percentage_literal(pair),
        Rule::quantity_literal => parse_quantity_literal(pair),
        Rule::boolean_literal => parse_boolean_literal(pair),
        Rule::text_literal => parse_text_literal(pair),
        _ => Err(PublicodesError::Engine(format!(
            "Unsupported literal type: {:?}",
            pair.as_rule()
        ))),
    }
}

/// Parse a decimal number, accepting scientific notation (`1e6`)
pub fn parse_decimal(text: &str) -> Result<Decimal, PublicodesError> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| PublicodesError::Engine(format!("Invalid number '{}': {}", text, e)))
}

fn parse_inner_number(pair: Pair<Rule>) -> Result<Decimal, PublicodesError> {
    let text = pair.as_str();
    let number = pair
        .into_inner()
        .find(|inner| inner.as_rule() == Rule::number)
        .ok_or_else(|| PublicodesError::Engine(format!("Missing number in '{}'", text)))?;
    parse_decimal(number.as_str())
}

/// `40 %` is the ratio 0.4 and carries no unit
fn parse_percentage_literal(
    pair: Pair<Rule>,
) -> Result<(LiteralValue, Option<Unit>), PublicodesError> {
    let percentage = parse_inner_number(pair)?;
    Ok((
        LiteralValue::Number(percentage / Decimal::ONE_HUNDRED),
        None,
    ))
}

fn parse_quantity_literal(
    pair: Pair<Rule>,
) -> Result<(LiteralValue, Option<Unit>), PublicodesError> {
    let text = pair.as_str();
    let mut number = None;
    let mut unit = None;

    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::number => number = Some(parse_decimal(inner_pair.as_str())?),
            Rule::unit => unit = unit_from_str(inner_pair.as_str()),
            _ => {}
        }
    }

    let value = number
        .ok_or_else(|| PublicodesError::Engine(format!("Missing number in '{}'", text)))?;
    Ok((LiteralValue::Number(value), unit))
}

/// Booleans are written `oui` and `non`
fn parse_boolean_literal(
    pair: Pair<Rule>,
) -> Result<(LiteralValue, Option<Unit>), PublicodesError> {
    let boolean = match pair.as_str() {
        "oui" => true,
        "non" => false,
        other => {
            return Err(PublicodesError::Engine(format!(
                "Invalid boolean: '{}'. Expected 'oui' or 'non'",
                other
            )))
        }
    };
    Ok((LiteralValue::Boolean(boolean), None))
}

fn parse_text_literal(pair: Pair<Rule>) -> Result<(LiteralValue, Option<Unit>), PublicodesError> {
    let content = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str().to_string())
        .unwrap_or_default();
    Ok((LiteralValue::Text(content), None))
}
