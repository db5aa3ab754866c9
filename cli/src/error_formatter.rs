use ariadne::{Color, Label, Report, ReportKind, Source};
use publicodes::{ErrorDetails, PublicodesError};

/// Format a PublicodesError with fancy terminal output using Ariadne
pub fn format_error(error: &PublicodesError) -> String {
    match error {
        PublicodesError::Parse(details) => format_details("Parse error", details, error),
        PublicodesError::Semantic(details) => format_details("Semantic error", details, error),
        PublicodesError::Situation { rule, message } => {
            format!("Situation error for '{}': {}", rule, message)
        }
        PublicodesError::UnknownRule(name) => format!(
            "Rule '{}' not found\n  Run `publicodes list <RULES>` to see the available rules",
            name
        ),
        PublicodesError::Runtime(msg) => format!("Runtime error: {}", msg),
        PublicodesError::Engine(msg) => format!("Engine error: {}", msg),
        PublicodesError::CircularDependency(msg) => format!("Circular dependency: {}", msg),
        PublicodesError::ResourceLimitExceeded {
            limit_name,
            limit_value,
            actual_value,
            suggestion,
        } => {
            format!(
                "Resource limit exceeded: {}\n  Limit: {}\n  Actual: {}\n  {}",
                limit_name, limit_value, actual_value, suggestion
            )
        }
        PublicodesError::MultipleErrors(errors) => {
            let mut result = String::from("Multiple errors occurred:\n\n");
            for error in errors {
                result.push_str(&format_error(error));
                result.push_str("\n\n");
            }
            result
        }
    }
}

/// Render an error pointing into the expression string of a rule
fn format_details(error_type: &str, details: &ErrorDetails, error: &PublicodesError) -> String {
    let mut output = Vec::new();
    let source_id = details.source_id.as_str();

    let message = format!(
        "{}: {} (in '{}' at {}:{})",
        error_type, details.message, source_id, details.span.line, details.span.col
    );

    let mut report = Report::build(ReportKind::Error, source_id, details.span.start)
        .with_message(message)
        .with_label(
            Label::new((source_id, details.span.start..details.span.end))
                .with_message("")
                .with_color(Color::Red),
        );

    if let Some(suggestion) = &details.suggestion {
        report = report.with_help(suggestion);
    }

    match report.finish().write(
        (source_id, Source::from(details.source_text.as_ref())),
        &mut output,
    ) {
        Ok(_) => String::from_utf8_lossy(&output).to_string(),
        Err(_) => {
            // Fallback to simple format
            format!("{}", error)
        }
    }
}
