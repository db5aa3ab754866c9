use crate::ast::Span;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Separator between the segments of a dotted rule name
pub const NAME_SEPARATOR: &str = " . ";

/// A rule of the rule set
///
/// Rule-level keys (`applicable si`, `non applicable si`, `unité`,
/// `par défaut`) are kept apart from the value so that a situation entry can
/// replace the value while the conditions and the unit still apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    pub name: String,
    pub meta: RuleMeta,
    pub unit: Option<Unit>,
    pub applicable_if: Option<Expression>,
    pub not_applicable_if: Option<Expression>,
    pub value: Option<Expression>,
    pub default: Option<Expression>,
}

/// Informational keys of a rule, never evaluated
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl RuleDefinition {
    /// An empty rule, used for namespaces that only exist through their children
    pub fn namespace(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta: RuleMeta::default(),
            unit: None,
            applicable_if: None,
            not_applicable_if: None,
            value: None,
            default: None,
        }
    }

    /// Name of the enclosing namespace, if any
    pub fn parent(&self) -> Option<&str> {
        parent_name(&self.name)
    }

    /// Last segment of the dotted name
    pub fn short_name(&self) -> &str {
        self.name
            .rsplit(NAME_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }

    /// All expressions of the rule, in evaluation order
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> {
        self.applicable_if
            .iter()
            .chain(self.not_applicable_if.iter())
            .chain(self.value.iter())
            .chain(self.default.iter())
    }

    pub fn expressions_mut(&mut self) -> impl Iterator<Item = &mut Expression> {
        self.applicable_if
            .iter_mut()
            .chain(self.not_applicable_if.iter_mut())
            .chain(self.value.iter_mut())
            .chain(self.default.iter_mut())
    }
}

/// Name of the namespace enclosing `name`
pub fn parent_name(name: &str) -> Option<&str> {
    name.rfind(NAME_SEPARATOR).map(|index| &name[..index])
}

/// All enclosing namespaces of `name`, innermost first
pub fn ancestor_names(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent_name(name), |current| parent_name(current))
}

/// An expression that can be evaluated, with its location in the source string
///
/// Expressions parsed from a string keep that string in `source` so that
/// later errors can point into it. Mechanism nodes have neither.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Option<Span>,
    pub source: Option<Arc<str>>,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Option<Span>) -> Self {
        Self {
            kind,
            span,
            source: None,
        }
    }

    pub fn parsed(kind: ExpressionKind, span: Span, source: &Arc<str>) -> Self {
        Self {
            kind,
            span: Some(span),
            source: Some(Arc::clone(source)),
        }
    }

    pub fn literal(value: LiteralValue, unit: Option<Unit>) -> Self {
        Self::new(ExpressionKind::Literal(value, unit), None)
    }

    /// Direct sub-expressions, in evaluation order
    pub fn children(&self) -> Vec<&Expression> {
        match &self.kind {
            ExpressionKind::Literal(..) | ExpressionKind::Reference(_) => Vec::new(),
            ExpressionKind::Arithmetic(left, _, right)
            | ExpressionKind::Comparison(left, _, right)
            | ExpressionKind::Ceiling(left, right)
            | ExpressionKind::Floor(left, right)
            | ExpressionKind::Rounding(left, right)
            | ExpressionKind::ApplicableIf(left, right)
            | ExpressionKind::NotApplicableIf(left, right) => vec![left.as_ref(), right.as_ref()],
            ExpressionKind::Negation(inner)
            | ExpressionKind::UnitConversion(inner, _)
            | ExpressionKind::Predicate(_, inner) => vec![inner.as_ref()],
            ExpressionKind::Sum(items)
            | ExpressionKind::Product(items)
            | ExpressionKind::AllOf(items)
            | ExpressionKind::AnyOf(items) => items.iter().collect(),
            ExpressionKind::Variations(branches, otherwise) => branches
                .iter()
                .flat_map(|branch| [&branch.condition, &branch.consequence])
                .chain(otherwise.as_deref())
                .collect(),
            ExpressionKind::Scale(scale) => std::iter::once(&scale.base)
                .chain(scale.multiplier.as_ref())
                .chain(
                    scale
                        .brackets
                        .iter()
                        .flat_map(|bracket| std::iter::once(&bracket.rate).chain(&bracket.ceiling)),
                )
                .collect(),
        }
    }

    /// Mutable counterpart of [`Expression::children`]
    pub fn children_mut(&mut self) -> Vec<&mut Expression> {
        match &mut self.kind {
            ExpressionKind::Literal(..) | ExpressionKind::Reference(_) => Vec::new(),
            ExpressionKind::Arithmetic(left, _, right)
            | ExpressionKind::Comparison(left, _, right)
            | ExpressionKind::Ceiling(left, right)
            | ExpressionKind::Floor(left, right)
            | ExpressionKind::Rounding(left, right)
            | ExpressionKind::ApplicableIf(left, right)
            | ExpressionKind::NotApplicableIf(left, right) => vec![left.as_mut(), right.as_mut()],
            ExpressionKind::Negation(inner)
            | ExpressionKind::UnitConversion(inner, _)
            | ExpressionKind::Predicate(_, inner) => vec![inner.as_mut()],
            ExpressionKind::Sum(items)
            | ExpressionKind::Product(items)
            | ExpressionKind::AllOf(items)
            | ExpressionKind::AnyOf(items) => items.iter_mut().collect(),
            ExpressionKind::Variations(branches, otherwise) => branches
                .iter_mut()
                .flat_map(|branch| [&mut branch.condition, &mut branch.consequence])
                .chain(otherwise.as_deref_mut())
                .collect(),
            ExpressionKind::Scale(scale) => {
                let Scale {
                    base,
                    multiplier,
                    brackets,
                } = &mut **scale;
                std::iter::once(base)
                    .chain(multiplier.as_mut())
                    .chain(brackets.iter_mut().flat_map(|bracket| {
                        std::iter::once(&mut bracket.rate).chain(bracket.ceiling.as_mut())
                    }))
                    .collect()
            }
        }
    }
}

/// The kind of expression, covering both the inline grammar and the mechanisms
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(LiteralValue, Option<Unit>),
    Reference(RuleReference),
    Arithmetic(Box<Expression>, ArithmeticOperation, Box<Expression>),
    Comparison(Box<Expression>, ComparisonOperator, Box<Expression>),
    Negation(Box<Expression>),
    /// `somme`
    Sum(Vec<Expression>),
    /// `produit`
    Product(Vec<Expression>),
    /// `toutes ces conditions`
    AllOf(Vec<Expression>),
    /// `une de ces conditions`
    AnyOf(Vec<Expression>),
    /// `variations`
    Variations(Vec<Variation>, Option<Box<Expression>>),
    /// `barème`
    Scale(Box<Scale>),
    /// `plafond`
    Ceiling(Box<Expression>, Box<Expression>),
    /// `plancher`
    Floor(Box<Expression>, Box<Expression>),
    /// `arrondi`: the second expression is `oui`/`non` or a number of decimals
    Rounding(Box<Expression>, Box<Expression>),
    /// `unité` inside a nested mechanism
    UnitConversion(Box<Expression>, Unit),
    /// `applicable si` inside a nested mechanism
    ApplicableIf(Box<Expression>, Box<Expression>),
    /// `non applicable si` inside a nested mechanism
    NotApplicableIf(Box<Expression>, Box<Expression>),
    /// `est applicable`, `est non applicable`, `est défini`, `est non défini`
    Predicate(PredicateKind, Box<Expression>),
}

/// Reference to another rule
///
/// `written` is the name as it appears in the source, `name` the full dotted
/// name it resolves to. Both are equal until references are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RuleReference {
    pub written: String,
    pub name: String,
}

impl RuleReference {
    pub fn new(written: impl Into<String>) -> Self {
        let written = written.into();
        Self {
            name: written.clone(),
            written,
        }
    }
}

/// One `si`/`alors` branch of `variations`
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub condition: Expression,
    pub consequence: Expression,
}

/// `barème`: marginal rates applied bracket by bracket
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub base: Expression,
    pub multiplier: Option<Expression>,
    pub brackets: Vec<Bracket>,
}

/// A bracket of a `barème`; the last one usually has no ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct Bracket {
    pub rate: Expression,
    pub ceiling: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    IsApplicable,
    IsNotApplicable,
    IsDefined,
    IsUndefined,
}

impl PredicateKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            PredicateKind::IsApplicable => "est applicable",
            PredicateKind::IsNotApplicable => "est non applicable",
            PredicateKind::IsDefined => "est défini",
            PredicateKind::IsUndefined => "est non défini",
        }
    }
}

/// Arithmetic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArithmeticOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOperation {
    /// Returns a human-readable name for the operation
    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticOperation::Add => "addition",
            ArithmeticOperation::Subtract => "subtraction",
            ArithmeticOperation::Multiply => "multiplication",
            ArithmeticOperation::Divide => "division",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOperation::Add => "+",
            ArithmeticOperation::Subtract => "-",
            ArithmeticOperation::Multiply => "*",
            ArithmeticOperation::Divide => "/",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
    NotEqual,
}

impl ComparisonOperator {
    /// Returns a human-readable name for the operator
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => "greater than",
            ComparisonOperator::LessThan => "less than",
            ComparisonOperator::GreaterThanOrEqual => "greater than or equal",
            ComparisonOperator::LessThanOrEqual => "less than or equal",
            ComparisonOperator::Equal => "equal",
            ComparisonOperator::NotEqual => "not equal",
        }
    }
}

/// A literal value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Number(Decimal),
    Boolean(bool),
    Text(String),
}

impl LiteralValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Number(_) => "number",
            LiteralValue::Boolean(_) => "boolean",
            LiteralValue::Text(_) => "text",
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            LiteralValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LiteralValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Size of the value in bytes, checked against resource limits
    pub fn byte_size(&self) -> usize {
        match self {
            LiteralValue::Number(_) => std::mem::size_of::<Decimal>(),
            LiteralValue::Boolean(_) => 1,
            LiteralValue::Text(s) => s.len(),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{}", n.normalize()),
            LiteralValue::Boolean(true) => write!(f, "oui"),
            LiteralValue::Boolean(false) => write!(f, "non"),
            LiteralValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// A unit such as `€`, `€/an` or `enfant`
///
/// Stored simplified: identical factors on both sides cancel out and each
/// side is sorted, so equal units compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unit {
    pub numerators: Vec<String>,
    pub denominators: Vec<String>,
}

impl Unit {
    /// Build a simplified unit; returns None when everything cancels out
    pub fn new(numerators: Vec<String>, denominators: Vec<String>) -> Option<Self> {
        let mut numerators = numerators;
        let mut denominators = denominators;
        numerators.retain(|factor| {
            if let Some(index) = denominators.iter().position(|d| d == factor) {
                denominators.remove(index);
                false
            } else {
                true
            }
        });
        if numerators.is_empty() && denominators.is_empty() {
            return None;
        }
        numerators.sort();
        denominators.sort();
        Some(Self {
            numerators,
            denominators,
        })
    }

    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            numerators: vec![name.into()],
            denominators: Vec::new(),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.numerators.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", self.numerators.join("."))?;
        }
        if !self.denominators.is_empty() {
            write!(f, "/{}", self.denominators.join("."))?;
        }
        Ok(())
    }
}

impl Serialize for Unit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
