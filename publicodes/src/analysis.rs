//! Reference and dependency analysis utilities
//!
//! Extracts references from expressions and orders rules by their
//! dependencies. Used by validation when a rule set is loaded and by the CLI
//! to display what a rule depends on.

use crate::semantic::{Expression, ExpressionKind, RuleDefinition, RuleReference};
use crate::{PublicodesError, PublicodesResult};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Collect the resolved names of all rules referenced by an expression
pub fn extract_references(expr: &Expression) -> BTreeSet<String> {
    let mut references = BTreeSet::new();
    collect_references(expr, &mut references);
    references
}

fn collect_references(expr: &Expression, references: &mut BTreeSet<String>) {
    if let ExpressionKind::Reference(reference) = &expr.kind {
        references.insert(reference.name.clone());
    }
    for child in expr.children() {
        collect_references(child, references);
    }
}

/// Call `f` on every reference of an expression, allowing it to rewrite them
pub fn for_each_reference_mut<F>(expr: &mut Expression, f: &mut F)
where
    F: FnMut(&mut RuleReference, &Expression),
{
    if let ExpressionKind::Reference(reference) = &expr.kind {
        let mut reference = reference.clone();
        f(&mut reference, expr);
        expr.kind = ExpressionKind::Reference(reference);
        return;
    }
    for child in expr.children_mut() {
        for_each_reference_mut(child, f);
    }
}

/// Rules referenced anywhere in a rule's own definition
pub fn rule_dependencies(rule: &RuleDefinition) -> BTreeSet<String> {
    let mut references = BTreeSet::new();
    for expr in rule.expressions() {
        collect_references(expr, &mut references);
    }
    references
}

/// Build a dependency graph: rule name -> names of the rules it references.
///
/// Only references written in a rule's own definition are edges. Ancestor
/// applicability is checked at evaluation time and guarded there.
pub fn build_dependency_graph<'a>(
    rules: impl IntoIterator<Item = &'a RuleDefinition>,
) -> HashMap<String, HashSet<String>> {
    rules
        .into_iter()
        .map(|rule| {
            let dependencies = rule_dependencies(rule).into_iter().collect();
            (rule.name.clone(), dependencies)
        })
        .collect()
}

/// Topological sort of rules, dependencies first.
///
/// Graph format: node -> set of rules that node depends on. Returns a
/// `CircularDependency` error naming the rules left on a cycle.
pub fn topological_sort(graph: &HashMap<String, HashSet<String>>) -> PublicodesResult<Vec<String>> {
    // Build reverse graph: node -> set of rules that depend on node
    let mut reverse_graph: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut all_nodes: HashSet<&str> = HashSet::new();

    for (node, dependencies) in graph {
        all_nodes.insert(node);
        reverse_graph.entry(node).or_default();

        for dep in dependencies {
            all_nodes.insert(dep);
            reverse_graph.entry(dep).or_default().insert(node);
        }
    }

    // Count how many dependencies each node has
    let mut dependency_count: HashMap<&str, usize> = all_nodes
        .iter()
        .map(|node| (*node, graph.get(*node).map_or(0, |deps| deps.len())))
        .collect();

    // Start with nodes that have no dependencies, in a stable order
    let mut roots: Vec<&str> = dependency_count
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(node, _)| *node)
        .collect();
    roots.sort_unstable();
    let mut queue: VecDeque<&str> = roots.into();

    let mut result = Vec::with_capacity(all_nodes.len());

    while let Some(node) = queue.pop_front() {
        result.push(node.to_string());

        if let Some(dependents) = reverse_graph.get(node) {
            let mut ready = Vec::new();
            for dependent in dependents {
                if let Some(count) = dependency_count.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(*dependent);
                    }
                }
            }
            ready.sort_unstable();
            queue.extend(ready);
        }
    }

    if result.len() != all_nodes.len() {
        let mut cycle: Vec<&str> = dependency_count
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node)
            .collect();
        cycle.sort_unstable();
        return Err(PublicodesError::CircularDependency(format!(
            "rules referencing each other: {}",
            cycle.join(", ")
        )));
    }

    Ok(result)
}
