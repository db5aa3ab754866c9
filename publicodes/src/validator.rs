//! Semantic validation of a parsed rule set
//!
//! Runs once when a rule set is loaded:
//! 1. Rejects duplicate rule names
//! 2. Adds the namespaces implied by dotted names
//! 3. Resolves every reference to the full name of a rule
//! 4. Rejects cycles between rule definitions
//!
//! All errors of a step are reported together.

use crate::analysis::{build_dependency_graph, for_each_reference_mut, topological_sort};
use crate::ast::Span;
use crate::semantic::{
    ancestor_names, parent_name, Expression, RuleDefinition, RuleReference, NAME_SEPARATOR,
};
use crate::{PublicodesError, PublicodesResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Rules that passed validation, keyed by full name
pub struct ValidatedRules {
    pub rules: HashMap<String, RuleDefinition>,
    pub evaluation_order: Vec<String>,
}

#[derive(Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, definitions: Vec<RuleDefinition>) -> PublicodesResult<ValidatedRules> {
        let mut rules = self.index_rules(definitions)?;
        self.resolve_all_references(&mut rules)?;

        let graph = build_dependency_graph(rules.values());
        let evaluation_order = topological_sort(&graph)?;

        Ok(ValidatedRules {
            rules,
            evaluation_order,
        })
    }

    fn index_rules(
        &self,
        definitions: Vec<RuleDefinition>,
    ) -> PublicodesResult<HashMap<String, RuleDefinition>> {
        let mut rules: HashMap<String, RuleDefinition> = HashMap::with_capacity(definitions.len());
        let mut errors = Vec::new();

        for definition in definitions {
            if rules.contains_key(&definition.name) {
                errors.push(PublicodesError::Engine(format!(
                    "Rule '{}' is defined more than once",
                    definition.name
                )));
                continue;
            }
            rules.insert(definition.name.clone(), definition);
        }

        if !errors.is_empty() {
            return Err(PublicodesError::from_many(errors));
        }

        let implied: HashSet<String> = rules
            .keys()
            .flat_map(|name| ancestor_names(name).map(str::to_string).collect::<Vec<_>>())
            .filter(|name| !rules.contains_key(name))
            .collect();
        for namespace in implied {
            rules.insert(namespace.clone(), RuleDefinition::namespace(namespace));
        }

        Ok(rules)
    }

    fn resolve_all_references(
        &self,
        rules: &mut HashMap<String, RuleDefinition>,
    ) -> PublicodesResult<()> {
        let names: HashSet<String> = rules.keys().cloned().collect();
        let mut errors = Vec::new();

        for rule in rules.values_mut() {
            let context = rule.name.clone();
            for expr in rule.expressions_mut() {
                if let Err(e) = resolve_references(expr, &context, &names) {
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PublicodesError::from_many(errors))
        }
    }
}

/// Resolve the references of an expression written inside rule `context`
///
/// An empty `context` resolves from the root namespace only.
pub fn resolve_references(
    expr: &mut Expression,
    context: &str,
    names: &HashSet<String>,
) -> PublicodesResult<()> {
    let mut errors = Vec::new();

    let mut resolve = |reference: &mut RuleReference, node: &Expression| {
        match resolve_name(&reference.written, context, |candidate| {
            names.contains(candidate)
        }) {
            Some(resolved) => reference.name = resolved,
            None => errors.push(unknown_reference_error(&reference.written, context, node)),
        }
    };
    for_each_reference_mut(expr, &mut resolve);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PublicodesError::from_many(errors))
    }
}

/// Find the rule a name written in `context` refers to.
///
/// Looks in the namespace of `context` itself, then in each enclosing
/// namespace, then at the root: inside `a . b`, `c` resolves to the first of
/// `a . b . c`, `a . c`, `c` that exists.
pub fn resolve_name<F>(written: &str, context: &str, exists: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let mut namespace = (!context.is_empty()).then_some(context);
    while let Some(current) = namespace {
        let candidate = format!("{}{}{}", current, NAME_SEPARATOR, written);
        if exists(&candidate) {
            return Some(candidate);
        }
        namespace = parent_name(current);
    }
    exists(written).then(|| written.to_string())
}

fn unknown_reference_error(
    written: &str,
    context: &str,
    node: &Expression,
) -> PublicodesError {
    let message = if context.is_empty() {
        format!("Unknown reference '{}'", written)
    } else {
        format!("Unknown reference '{}' in rule '{}'", written, context)
    };
    let source_id = if context.is_empty() {
        "<expression>"
    } else {
        context
    };

    match (&node.span, &node.source) {
        (Some(span), Some(source)) => PublicodesError::semantic_with_suggestion(
            message,
            span.clone(),
            source_id,
            Arc::clone(source),
            "References resolve from the rule's own namespace up to the root",
        ),
        _ => PublicodesError::semantic(
            message,
            Span {
                start: 0,
                end: written.len(),
                line: 1,
                col: 1,
            },
            source_id,
            Arc::from(written),
        ),
    }
}
