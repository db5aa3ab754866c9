use crate::ast::Span;
use std::fmt;
use std::sync::Arc;

/// Detailed error information with source location
///
/// `source_id` names the rule (and mechanism) the expression was written in,
/// `source_text` is the expression string the span points into.
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: String,
    pub span: Span,
    pub source_id: String,
    pub source_text: Arc<str>,
    pub suggestion: Option<String>,
}

/// Error types for rule-set loading, situations and evaluation
#[derive(Debug, Clone)]
pub enum PublicodesError {
    /// Malformed expression, unit or mechanism, with source location
    Parse(Box<ErrorDetails>),

    /// Reference that does not resolve, with source location
    Semantic(Box<ErrorDetails>),

    /// Situation entry naming an unknown rule or carrying a malformed value
    Situation { rule: String, message: String },

    /// Evaluation target that is neither a rule nor a valid expression
    UnknownRule(String),

    /// Failure while evaluating (unit mismatch, type error, division by zero)
    Runtime(String),

    /// Rule set or engine error without specific source location
    Engine(String),

    /// Circular dependency error
    CircularDependency(String),

    /// A resource limit was exceeded
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },

    /// Multiple errors collected together
    MultipleErrors(Vec<PublicodesError>),
}

impl PublicodesError {
    /// Create a parse error with source information
    pub fn parse(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: None,
        }))
    }

    /// Create a parse error with suggestion
    pub fn parse_with_suggestion(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: Some(suggestion.into()),
        }))
    }

    /// Create a semantic error with source information
    pub fn semantic(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self::Semantic(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: None,
        }))
    }

    /// Create a semantic error with suggestion
    pub fn semantic_with_suggestion(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Semantic(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: Some(suggestion.into()),
        }))
    }

    pub fn situation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Situation {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Collapse a list of errors: one error stays as is, several are grouped
    pub fn from_many(mut errors: Vec<PublicodesError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            PublicodesError::MultipleErrors(errors)
        }
    }
}

impl fmt::Display for PublicodesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicodesError::Parse(details) => {
                write!(f, "Parse error: {}", details.message)?;
                if let Some(suggestion) = &details.suggestion {
                    write!(f, " (suggestion: {})", suggestion)?;
                }
                write!(
                    f,
                    " in '{}' at {}:{}",
                    details.source_id, details.span.line, details.span.col
                )
            }
            PublicodesError::Semantic(details) => {
                write!(f, "Semantic error: {}", details.message)?;
                if let Some(suggestion) = &details.suggestion {
                    write!(f, " (suggestion: {})", suggestion)?;
                }
                write!(
                    f,
                    " in '{}' at {}:{}",
                    details.source_id, details.span.line, details.span.col
                )
            }
            PublicodesError::Situation { rule, message } => {
                write!(f, "Situation error for '{}': {}", rule, message)
            }
            PublicodesError::UnknownRule(name) => write!(f, "Rule '{}' not found", name),
            PublicodesError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            PublicodesError::Engine(msg) => write!(f, "Engine error: {}", msg),
            PublicodesError::CircularDependency(msg) => write!(f, "Circular dependency: {}", msg),
            PublicodesError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
                suggestion,
            } => write!(
                f,
                "Resource limit exceeded: {} (limit: {}, actual: {}). {}",
                limit_name, limit_value, actual_value, suggestion
            ),
            PublicodesError::MultipleErrors(errors) => {
                writeln!(f, "Multiple errors:")?;
                for (i, error) in errors.iter().enumerate() {
                    write!(f, "  {}. {}", i + 1, error)?;
                    if i < errors.len() - 1 {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PublicodesError {}

impl From<serde_json::Error> for PublicodesError {
    fn from(err: serde_json::Error) -> Self {
        PublicodesError::Engine(format!("Invalid rule set JSON: {}", err))
    }
}
