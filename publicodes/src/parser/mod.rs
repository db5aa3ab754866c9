use crate::ast::{DepthTracker, Span};
use crate::error::PublicodesError;
use crate::resource_limits::ResourceLimits;
use crate::semantic::{Expression, RuleDefinition};
use pest::Parser;
use pest_derive::Parser;
use std::sync::Arc;

pub mod expressions;
pub mod literals;
pub mod mechanisms;
pub mod rules;
pub mod units;

pub use units::parse_unit;

#[derive(Parser)]
#[grammar = "src/parser/publicodes.pest"]
pub struct PublicodesParser;

/// Parse a precompiled rule set: a JSON object mapping dotted rule names to rule bodies
pub fn parse_rule_set(
    content: &str,
    limits: &ResourceLimits,
) -> Result<Vec<RuleDefinition>, PublicodesError> {
    if content.len() > limits.max_rules_bytes {
        return Err(PublicodesError::ResourceLimitExceeded {
            limit_name: "max_rules_bytes".to_string(),
            limit_value: format!(
                "{} bytes ({} MB)",
                limits.max_rules_bytes,
                limits.max_rules_bytes / (1024 * 1024)
            ),
            actual_value: format!(
                "{} bytes ({:.2} MB)",
                content.len(),
                content.len() as f64 / (1024.0 * 1024.0)
            ),
            suggestion: "Split the rule set into several files".to_string(),
        });
    }

    let value: serde_json::Value = serde_json::from_str(content)?;
    rules::parse_rules_value(&value, limits)
}

/// Parse an expression string written in the rule `source_id`
pub fn parse_expression(
    input: &str,
    source_id: &str,
    limits: &ResourceLimits,
) -> Result<Expression, PublicodesError> {
    let mut depth = DepthTracker::with_max_depth(limits.max_expression_depth);
    parse_expression_with_depth(input, source_id, &mut depth)
}

pub(crate) fn parse_expression_with_depth(
    input: &str,
    source_id: &str,
    depth: &mut DepthTracker,
) -> Result<Expression, PublicodesError> {
    check_nesting(input, depth.max_depth())?;

    let pairs = PublicodesParser::parse(Rule::expression_input, input)
        .map_err(|e| pest_error(e, input, source_id))?;

    let expression_pair = pairs
        .flatten()
        .find(|pair| pair.as_rule() == Rule::expression)
        .ok_or_else(|| {
            PublicodesError::Engine(format!("No expression found in '{}'", input))
        })?;

    let source = expressions::SourceText::new(input);
    expressions::parse_expression_pair(expression_pair, &source, depth)
}

/// Reject deeply parenthesized input before handing it to the recursive parser
fn check_nesting(input: &str, max_depth: usize) -> Result<(), PublicodesError> {
    let mut current: usize = 0;
    let mut deepest: usize = 0;
    for c in input.chars() {
        match c {
            '(' => {
                current += 1;
                deepest = deepest.max(current);
            }
            ')' => current = current.saturating_sub(1),
            _ => {}
        }
    }
    if deepest > max_depth {
        return Err(PublicodesError::ResourceLimitExceeded {
            limit_name: "max_expression_depth".to_string(),
            limit_value: max_depth.to_string(),
            actual_value: deepest.to_string(),
            suggestion: "Split the expression into intermediate rules".to_string(),
        });
    }
    Ok(())
}

fn pest_error(error: pest::error::Error<Rule>, input: &str, source_id: &str) -> PublicodesError {
    let (start, end) = match error.location {
        pest::error::InputLocation::Pos(pos) => (pos, pos),
        pest::error::InputLocation::Span((start, end)) => (start, end),
    };
    let (line, col) = match error.line_col {
        pest::error::LineColLocation::Pos((line, col)) => (line, col),
        pest::error::LineColLocation::Span((line, col), _) => (line, col),
    };

    PublicodesError::parse_with_suggestion(
        format!("Cannot parse '{}': {}", input, error.variant.message()),
        Span {
            start,
            end,
            line,
            col,
        },
        source_id,
        Arc::from(input),
        "Operators must be surrounded by spaces and namespaces separated by ' . '",
    )
}
