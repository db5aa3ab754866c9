use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use publicodes::analysis::rule_dependencies;
use publicodes::{Engine, Evaluation, Expression, RuleDefinition, Situation, SituationValue};

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn format_evaluation(&self, evaluation: &Evaluation, situation: &Situation) -> String {
        let mut output = String::new();

        if !situation.is_empty() {
            output.push_str(&self.format_situation_table(situation));
            output.push('\n');
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.add_row(Row::from(vec![Cell::new(format!(
            "{} = {}",
            evaluation.expression,
            evaluation.display_value()
        ))]));

        let mut details = String::new();
        if !evaluation.missing_variables.is_empty() {
            details.push_str("Missing inputs:\n");
            for name in &evaluation.missing_variables {
                details.push_str(&format!("├─ {}\n", name));
            }
        }
        if !evaluation.traversed_variables.is_empty() {
            details.push_str(&format!(
                "Rules visited: {}\n",
                evaluation.traversed_variables.len()
            ));
        }
        let details = details.trim_end();
        if !details.is_empty() {
            table.add_row(Row::from(vec![Cell::new(details)]));
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_situation_table(&self, situation: &Situation) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Situation").set_alignment(CellAlignment::Left),
            Cell::new("Value").set_alignment(CellAlignment::Left),
        ]));

        for (name, value) in situation.iter() {
            let value_str = match value {
                SituationValue::Number(n) => n.to_string(),
                SituationValue::Boolean(true) => "oui".to_string(),
                SituationValue::Boolean(false) => "non".to_string(),
                SituationValue::Quantity { magnitude, unit } => format!("{} {}", magnitude, unit),
                SituationValue::Expression(text) => text.clone(),
            };
            table.add_row(Row::from(vec![name.to_string(), value_str]));
        }

        table.to_string()
    }

    pub fn format_rule_list(&self, engine: &Engine) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Rule").set_alignment(CellAlignment::Left),
            Cell::new("Title").set_alignment(CellAlignment::Left),
            Cell::new("Unit").set_alignment(CellAlignment::Left),
        ]));

        let names = engine.rule_names();
        for name in &names {
            let Some(rule) = engine.get_rule(name) else {
                continue;
            };
            table.add_row(Row::from(vec![
                Cell::new(name),
                Cell::new(rule.meta.title.as_deref().unwrap_or("")),
                Cell::new(rule.unit.as_ref().map(|u| u.to_string()).unwrap_or_default()),
            ]));
        }

        format!("{}\n{} rule(s)\n", table, names.len())
    }

    pub fn format_rule(&self, rule: &RuleDefinition, engine: &Engine) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.add_row(Row::from(vec![Cell::new(&rule.name)]));

        let mut content = String::new();
        let meta = &rule.meta;
        for (label, value) in [
            ("Title", &meta.title),
            ("Description", &meta.description),
            ("Question", &meta.question),
            ("Note", &meta.note),
        ] {
            if let Some(value) = value {
                content.push_str(&format!("{}: {}\n", label, value));
            }
        }
        if let Some(unit) = &rule.unit {
            content.push_str(&format!("Unit: {}\n", unit));
        }
        for (label, expr) in [
            ("Applicable if", &rule.applicable_if),
            ("Not applicable if", &rule.not_applicable_if),
            ("Value", &rule.value),
            ("Default", &rule.default),
        ] {
            if let Some(expr) = expr {
                content.push_str(&format!("{}: {}\n", label, expression_text(expr)));
            }
        }
        for reference in &meta.references {
            content.push_str(&format!("Reference: {}\n", reference));
        }

        let dependencies = rule_dependencies(rule);
        if !dependencies.is_empty() {
            content.push_str("Depends on:\n");
            for dependency in &dependencies {
                content.push_str(&format!("├─ {}\n", dependency));
            }
        }

        let mut dependents: Vec<&str> = engine
            .rule_set()
            .rules()
            .filter(|other| rule_dependencies(other).contains(&rule.name))
            .map(|other| other.name.as_str())
            .collect();
        dependents.sort_unstable();
        if !dependents.is_empty() {
            content.push_str("Used by:\n");
            for dependent in dependents {
                content.push_str(&format!("├─ {}\n", dependent));
            }
        }

        let content = content.trim_end();
        if !content.is_empty() {
            table.add_row(Row::from(vec![Cell::new(content)]));
        }

        format!("{}\n", table)
    }
}

/// The string an expression was written as, when it comes from one
fn expression_text(expr: &Expression) -> String {
    let Some(source) = &expr.source else {
        return "(mechanism)".to_string();
    };
    expr.span
        .as_ref()
        .and_then(|span| source.get(span.start..span.end))
        .unwrap_or(source.as_ref())
        .to_string()
}
