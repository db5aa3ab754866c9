use crate::semantic::ExpressionKind;
use crate::validator::resolve_name;
use crate::{PublicodesError, RuleSet};
use std::collections::HashSet;

fn exists_in<'a>(names: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
    let names: HashSet<&str> = names.iter().copied().collect();
    move |candidate| names.contains(candidate)
}

#[test]
fn test_resolution_prefers_innermost_namespace() {
    let exists = exists_in(&["a . b . c", "a . c", "c"]);
    assert_eq!(resolve_name("c", "a . b", &exists).as_deref(), Some("a . b . c"));
}

#[test]
fn test_resolution_walks_up_to_root() {
    let exists = exists_in(&["a . c", "c"]);
    assert_eq!(resolve_name("c", "a . b", &exists).as_deref(), Some("a . c"));

    let exists = exists_in(&["c"]);
    assert_eq!(resolve_name("c", "a . b", &exists).as_deref(), Some("c"));
}

#[test]
fn test_resolution_from_root_context() {
    let exists = exists_in(&["a . c"]);
    assert_eq!(resolve_name("c", "", &exists), None);
    assert_eq!(resolve_name("a . c", "", &exists).as_deref(), Some("a . c"));
}

#[test]
fn test_dotted_reference_resolves_relative_to_namespace() {
    let exists = exists_in(&["x . a . c"]);
    assert_eq!(resolve_name("a . c", "x . y", &exists).as_deref(), Some("x . a . c"));
}

#[test]
fn test_rule_set_resolves_references() {
    let rules = RuleSet::from_json(
        r#"{
            "impôt": "revenu * taux",
            "impôt . taux": "10 %",
            "revenu": 100
        }"#,
    )
    .unwrap();

    let value = rules.get("impôt").unwrap().value.as_ref().unwrap();
    match &value.kind {
        ExpressionKind::Arithmetic(left, _, right) => {
            match (&left.kind, &right.kind) {
                (ExpressionKind::Reference(l), ExpressionKind::Reference(r)) => {
                    assert_eq!(l.name, "revenu");
                    assert_eq!(r.written, "taux");
                    assert_eq!(r.name, "impôt . taux");
                }
                other => panic!("Expected two references, got {:?}", other),
            }
        }
        other => panic!("Expected a product, got {:?}", other),
    }
}

#[test]
fn test_implied_namespaces_are_added() {
    let rules = RuleSet::from_json(r#"{ "a . b . c": 1 }"#).unwrap();
    assert!(rules.contains("a"));
    assert!(rules.contains("a . b"));
    assert!(rules.has_children("a . b"));
    assert!(!rules.has_children("a . b . c"));
    let ancestors: Vec<&str> = rules
        .ancestors("a . b . c")
        .map(|rule| rule.name.as_str())
        .collect();
    assert_eq!(ancestors, vec!["a . b", "a"]);
}

#[test]
fn test_unknown_reference_is_semantic_error() {
    let result = RuleSet::from_json(r#"{ "a": "b + inconnu", "b": 1 }"#);
    match result {
        Err(PublicodesError::Semantic(details)) => {
            assert!(details.message.contains("'inconnu'"));
            assert!(details.message.contains("rule 'a'"));
            assert_eq!(details.source_id, "a");
            assert_eq!(&*details.source_text, "b + inconnu");
            assert_eq!(details.span.start, 4);
        }
        other => panic!("Expected semantic error, got {:?}", other),
    }
}

#[test]
fn test_cycle_between_rules_is_rejected() {
    let result = RuleSet::from_json(r#"{ "a": "b + 1", "b": "a + 1" }"#);
    assert!(matches!(result, Err(PublicodesError::CircularDependency(_))));
}

#[test]
fn test_self_reference_is_rejected() {
    let result = RuleSet::from_json(r#"{ "a": "a + 1" }"#);
    assert!(matches!(result, Err(PublicodesError::CircularDependency(_))));
}
