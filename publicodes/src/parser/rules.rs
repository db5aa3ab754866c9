use super::mechanisms::MechanismParser;
use crate::ast::DepthTracker;
use crate::error::PublicodesError;
use crate::resource_limits::ResourceLimits;
use crate::semantic::{RuleDefinition, NAME_SEPARATOR};
use serde_json::{Map, Value};

/// Parse every rule of a rule-set JSON object, collecting all errors
pub(crate) fn parse_rules_value(
    value: &Value,
    limits: &ResourceLimits,
) -> Result<Vec<RuleDefinition>, PublicodesError> {
    let Value::Object(rules) = value else {
        return Err(PublicodesError::Engine(
            "A rule set must be a JSON object mapping rule names to rule bodies".to_string(),
        ));
    };

    let mut definitions = Vec::with_capacity(rules.len());
    let mut errors = Vec::new();

    for (name, body) in rules {
        match parse_rule_definition(name, body, limits) {
            Ok(definition) => definitions.push(definition),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(definitions)
    } else {
        Err(PublicodesError::from_many(errors))
    }
}

pub(crate) fn parse_rule_definition(
    raw_name: &str,
    body: &Value,
    limits: &ResourceLimits,
) -> Result<RuleDefinition, PublicodesError> {
    let name = normalize_rule_name(raw_name)?;
    let mut depth = DepthTracker::with_max_depth(limits.max_expression_depth);
    let mut parser = MechanismParser::new(&name, &mut depth);
    let mut rule = RuleDefinition::namespace(name.clone());

    match body {
        Value::Null => {}
        Value::Array(_) => {
            return Err(parser.error(raw_name, "A rule body cannot be a list"));
        }
        Value::Object(object) => {
            // Everything that is not a rule-level key makes up the value
            let mut value_mechanisms = Map::new();

            for (key, argument) in object {
                match key.as_str() {
                    "titre" => rule.meta.title = Some(text_argument(&parser, key, argument)?),
                    "description" => {
                        rule.meta.description = Some(text_argument(&parser, key, argument)?)
                    }
                    "question" => {
                        rule.meta.question = Some(text_argument(&parser, key, argument)?)
                    }
                    "note" => rule.meta.note = Some(text_argument(&parser, key, argument)?),
                    "références" => rule.meta.references = references_argument(argument),
                    "par défaut" => rule.default = Some(parser.parse_node(argument)?),
                    "applicable si" => rule.applicable_if = Some(parser.parse_node(argument)?),
                    "non applicable si" => {
                        rule.not_applicable_if = Some(parser.parse_node(argument)?)
                    }
                    "unité" => rule.unit = parser.parse_unit_argument(argument)?,
                    _ => {
                        value_mechanisms.insert(key.clone(), argument.clone());
                    }
                }
            }

            if !value_mechanisms.is_empty() {
                rule.value = Some(parser.parse_object(&value_mechanisms)?);
            }
        }
        scalar => rule.value = Some(parser.parse_node(scalar)?),
    }

    Ok(rule)
}

/// Trim each segment and re-join with the canonical separator
pub fn normalize_rule_name(raw_name: &str) -> Result<String, PublicodesError> {
    let segments: Vec<&str> = raw_name.trim().split(" . ").map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(PublicodesError::Engine(format!(
            "Invalid rule name '{}': empty namespace segment",
            raw_name
        )));
    }
    Ok(segments.join(NAME_SEPARATOR))
}

fn text_argument(
    parser: &MechanismParser,
    key: &str,
    argument: &Value,
) -> Result<String, PublicodesError> {
    match argument {
        Value::String(text) => Ok(text.clone()),
        _ => Err(parser.error(key, format!("'{}' expects a text", key))),
    }
}

/// `références` is either a list of links or an object mapping labels to links
fn references_argument(argument: &Value) -> Vec<String> {
    match argument {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::Object(links) => links
            .iter()
            .map(|(label, link)| match link.as_str() {
                Some(url) => format!("{}: {}", label, url),
                None => label.clone(),
            })
            .collect(),
        Value::String(link) => vec![link.clone()],
        _ => Vec::new(),
    }
}
