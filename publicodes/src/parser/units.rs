//! Unit parsing
//!
//! Units are written as factors joined by `.` (product) and `/` (quotient):
//! `€`, `€/an`, `€.an/mois`, `enfant`. Everything after the first `/` is a
//! denominator.

use super::{PublicodesParser, Rule};
use crate::ast::Span;
use crate::error::PublicodesError;
use crate::semantic::Unit;
use pest::Parser;
use std::sync::Arc;

/// Parse a standalone unit string such as the value of an `unité` key
pub fn parse_unit(input: &str, source_id: &str) -> Result<Option<Unit>, PublicodesError> {
    let trimmed = input.trim();
    let pairs = PublicodesParser::parse(Rule::unit_input, trimmed).map_err(|e| {
        PublicodesError::parse_with_suggestion(
            format!("Invalid unit '{}': {}", trimmed, e.variant.message()),
            Span {
                start: 0,
                end: trimmed.len(),
                line: 1,
                col: 1,
            },
            source_id,
            Arc::from(trimmed),
            "Write units as factors joined by '.' and '/', for example '€/an'",
        )
    })?;

    let unit_pair = pairs
        .flatten()
        .find(|pair| pair.as_rule() == Rule::unit)
        .ok_or_else(|| PublicodesError::Engine(format!("No unit found in '{}'", trimmed)))?;

    Ok(unit_from_str(unit_pair.as_str()))
}

/// Split an already validated unit string into numerators and denominators
pub(crate) fn unit_from_str(text: &str) -> Option<Unit> {
    let mut numerators = Vec::new();
    let mut denominators = Vec::new();

    let mut sides = text.splitn(2, '/');
    if let Some(numerator_side) = sides.next() {
        numerators.extend(
            numerator_side
                .split('.')
                .filter(|factor| !factor.is_empty())
                .map(str::to_string),
        );
    }
    if let Some(denominator_side) = sides.next() {
        denominators.extend(
            denominator_side
                .split(['.', '/'])
                .filter(|factor| !factor.is_empty())
                .map(str::to_string),
        );
    }

    Unit::new(numerators, denominators)
}
