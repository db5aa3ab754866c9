//! Conversion of parsed expression strings into `Expression` trees
//!
//! The grammar encodes precedence (comparison < additive < multiplicative <
//! unary), so each level folds its operands left to right. Every fold nests
//! the tree one level deeper and counts against the expression depth limit.

use super::literals::parse_literal;
use super::Rule;
use crate::ast::{DepthTracker, LineIndex, Span};
use crate::error::PublicodesError;
use crate::semantic::{
    ArithmeticOperation, ComparisonOperator, Expression, ExpressionKind, RuleReference,
};
use pest::iterators::Pair;
use std::sync::Arc;

/// An expression string shared by every node parsed from it
pub(crate) struct SourceText {
    text: Arc<str>,
    lines: LineIndex,
}

impl SourceText {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            lines: LineIndex::new(text),
        }
    }

    fn span(&self, span: pest::Span) -> Span {
        self.lines.span(span.start(), span.end())
    }

    fn node(&self, kind: ExpressionKind, span: Span) -> Expression {
        Expression::parsed(kind, span, &self.text)
    }
}

pub(crate) fn parse_expression_pair(
    pair: Pair<Rule>,
    source: &SourceText,
    depth: &mut DepthTracker,
) -> Result<Expression, PublicodesError> {
    let span = source.span(pair.as_span());
    match pair.as_rule() {
        Rule::expression => {
            let inner = pair.into_inner().next().ok_or_else(|| {
                PublicodesError::Engine("Empty expression in parse tree".to_string())
            })?;
            parse_expression_pair(inner, source, depth)
        }
        // Only parentheses add nesting; precedence levels do not
        Rule::parenthesized => {
            let inner = pair.into_inner().next().ok_or_else(|| {
                PublicodesError::Engine("Empty parentheses in parse tree".to_string())
            })?;
            depth.push()?;
            let result = parse_expression_pair(inner, source, depth);
            depth.pop();
            result
        }
        Rule::comparison => parse_comparison(pair, source, depth),
        Rule::additive | Rule::multiplicative => parse_arithmetic_chain(pair, source, depth),
        Rule::unary => parse_unary(pair, source, depth),
        Rule::reference => Ok(source.node(
            ExpressionKind::Reference(RuleReference::new(pair.as_str())),
            span,
        )),
        Rule::number_literal
        | Rule::percentage_literal
        | Rule::quantity_literal
        | Rule::boolean_literal
        | Rule::text_literal => {
            let (value, unit) = parse_literal(pair)?;
            Ok(source.node(ExpressionKind::Literal(value, unit), span))
        }
        other => Err(PublicodesError::Engine(format!(
            "Unexpected rule in expression: {:?}",
            other
        ))),
    }
}

fn parse_comparison(
    pair: Pair<Rule>,
    source: &SourceText,
    depth: &mut DepthTracker,
) -> Result<Expression, PublicodesError> {
    let span = source.span(pair.as_span());
    let mut inner = pair.into_inner();
    let left_pair = inner
        .next()
        .ok_or_else(|| PublicodesError::Engine("Comparison without operand".to_string()))?;
    let left = parse_expression_pair(left_pair, source, depth)?;

    let Some(operator_pair) = inner.next() else {
        return Ok(left);
    };
    let operator = match operator_pair.as_str() {
        "<" => ComparisonOperator::LessThan,
        "<=" => ComparisonOperator::LessThanOrEqual,
        ">" => ComparisonOperator::GreaterThan,
        ">=" => ComparisonOperator::GreaterThanOrEqual,
        "=" => ComparisonOperator::Equal,
        "!=" => ComparisonOperator::NotEqual,
        other => {
            return Err(PublicodesError::Engine(format!(
                "Unknown comparison operator '{}'",
                other
            )))
        }
    };
    let right_pair = inner.next().ok_or_else(|| {
        PublicodesError::Engine("Comparison without right operand".to_string())
    })?;
    let right = parse_expression_pair(right_pair, source, depth)?;

    Ok(source.node(
        ExpressionKind::Comparison(Box::new(left), operator, Box::new(right)),
        span,
    ))
}

fn parse_arithmetic_chain(
    pair: Pair<Rule>,
    source: &SourceText,
    depth: &mut DepthTracker,
) -> Result<Expression, PublicodesError> {
    let mut folds = 0;
    let result = fold_arithmetic_chain(pair, source, depth, &mut folds);
    depth.release(folds);
    result
}

fn fold_arithmetic_chain(
    pair: Pair<Rule>,
    source: &SourceText,
    depth: &mut DepthTracker,
    folds: &mut usize,
) -> Result<Expression, PublicodesError> {
    let chain_start = pair.as_span().start();
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| PublicodesError::Engine("Operation without operand".to_string()))?;
    let mut result = parse_expression_pair(first, source, depth)?;

    while let Some(operator_pair) = inner.next() {
        let operator = match operator_pair.as_str() {
            "+" => ArithmeticOperation::Add,
            "-" => ArithmeticOperation::Subtract,
            "*" => ArithmeticOperation::Multiply,
            "/" => ArithmeticOperation::Divide,
            other => {
                return Err(PublicodesError::Engine(format!(
                    "Unknown arithmetic operator '{}'",
                    other
                )))
            }
        };
        *folds += 1;
        depth.push()?;

        let operand_pair = inner.next().ok_or_else(|| {
            PublicodesError::Engine(format!("Missing operand after '{}'", operator.symbol()))
        })?;
        let operand_end = operand_pair.as_span().end();
        let operand = parse_expression_pair(operand_pair, source, depth)?;

        // The folded operation spans from the chain start to this operand
        result = source.node(
            ExpressionKind::Arithmetic(Box::new(result), operator, Box::new(operand)),
            source.lines.span(chain_start, operand_end),
        );
    }

    Ok(result)
}

fn parse_unary(
    pair: Pair<Rule>,
    source: &SourceText,
    depth: &mut DepthTracker,
) -> Result<Expression, PublicodesError> {
    let span = source.span(pair.as_span());
    let mut negated = false;
    let mut operand = None;

    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::negation => negated = true,
            _ => operand = Some(parse_expression_pair(inner_pair, source, depth)?),
        }
    }

    let operand =
        operand.ok_or_else(|| PublicodesError::Engine("Missing operand".to_string()))?;
    if negated {
        Ok(source.node(ExpressionKind::Negation(Box::new(operand)), span))
    } else {
        Ok(operand)
    }
}
