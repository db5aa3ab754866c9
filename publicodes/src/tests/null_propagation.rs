use crate::{Engine, LiteralValue, Situation, ValueStatus};
use rust_decimal::Decimal;

const STATUS_RULES: &str = r#"{
    "salarié": {
        "applicable si": "statut = 'cadre'"
    },
    "statut": {},
    "salarié . prime": "100 €",
    "salarié . prime . majorée": "prime * 2"
}"#;

fn engine(rules: &str) -> Engine {
    Engine::from_json(rules).unwrap_or_else(|e| panic!("Failed to load rules: {}", e))
}

#[test]
fn test_missing_input_is_reported() {
    let result = engine(r#"{ "revenu": {}, "impôt": "revenu * 10 %" }"#)
        .evaluate("impôt")
        .unwrap();
    assert_eq!(result.status, ValueStatus::Missing);
    assert_eq!(result.node_value, None);
    assert_eq!(result.missing_variables, vec!["revenu".to_string()]);
}

#[test]
fn test_not_applicable_is_not_zero() {
    let rules = r#"{
        "a": { "applicable si": "non", "valeur": 10 },
        "b": "a + 1"
    }"#;
    let result = engine(rules).evaluate("b").unwrap();
    assert_eq!(result.status, ValueStatus::NotApplicable);
    assert_eq!(result.node_value, None);
}

#[test]
fn test_missing_wins_over_not_applicable() {
    let rules = r#"{
        "a": { "applicable si": "non", "valeur": 10 },
        "b": {},
        "c": "a + b"
    }"#;
    let result = engine(rules).evaluate("c").unwrap();
    assert_eq!(result.status, ValueStatus::Missing);
}

#[test]
fn test_missing_condition_short_circuits() {
    let rules = r#"{
        "inconnu": {},
        "x": { "une de ces conditions": ["oui", "inconnu"] },
        "y": { "toutes ces conditions": ["non", "inconnu"] },
        "z": { "toutes ces conditions": ["oui", "inconnu"] }
    }"#;
    let engine = engine(rules);
    assert_eq!(
        engine.evaluate("x").unwrap().node_value,
        Some(LiteralValue::Boolean(true))
    );
    assert_eq!(
        engine.evaluate("y").unwrap().node_value,
        Some(LiteralValue::Boolean(false))
    );
    assert!(engine.evaluate("z").unwrap().is_missing());
}

#[test]
fn test_not_applicable_condition_is_false() {
    let rules = r#"{
        "fermé": { "applicable si": "non", "valeur": "oui" },
        "x": { "applicable si": "fermé", "valeur": 1 },
        "y": { "non applicable si": "fermé", "valeur": 1 }
    }"#;
    let engine = engine(rules);
    assert!(!engine.evaluate("x").unwrap().is_applicable());
    assert_eq!(
        engine.evaluate("y").unwrap().node_value,
        Some(LiteralValue::Number(Decimal::ONE))
    );
}

#[test]
fn test_variations_with_missing_condition() {
    let rules = r#"{
        "âge": {},
        "tarif": {
            "variations": [
                { "si": "âge < 18", "alors": 5 },
                { "sinon": 10 }
            ]
        }
    }"#;
    let result = engine(rules).evaluate("tarif").unwrap();
    assert!(result.is_missing());
    assert_eq!(result.missing_variables, vec!["âge".to_string()]);
}

#[test]
fn test_namespace_condition_applies_to_children() {
    let base = engine(STATUS_RULES);

    let cadre = base
        .shallow_copy()
        .with_situation(Situation::new().with("statut", "'cadre'"))
        .unwrap();
    let result = cadre.evaluate("salarié . prime . majorée").unwrap();
    assert_eq!(result.node_value, Some(LiteralValue::Number(Decimal::from(200))));

    let employé = base
        .shallow_copy()
        .with_situation(Situation::new().with("statut", "'employé'"))
        .unwrap();
    let result = employé.evaluate("salarié . prime . majorée").unwrap();
    assert_eq!(result.status, ValueStatus::NotApplicable);

    let result = base.evaluate("salarié . prime . majorée").unwrap();
    assert_eq!(result.status, ValueStatus::Missing);
    assert_eq!(result.missing_variables, vec!["statut".to_string()]);
}

#[test]
fn test_namespace_disabled_by_situation() {
    let engine = engine(STATUS_RULES)
        .with_situation(
            Situation::new()
                .with("statut", "'cadre'")
                .with("salarié", false),
        )
        .unwrap();
    let result = engine.evaluate("salarié . prime").unwrap();
    assert_eq!(result.status, ValueStatus::NotApplicable);
}

#[test]
fn test_namespace_without_value_is_true() {
    let engine = engine(STATUS_RULES)
        .with_situation(Situation::new().with("statut", "'cadre'"))
        .unwrap();
    assert_eq!(
        engine.evaluate("salarié").unwrap().node_value,
        Some(LiteralValue::Boolean(true))
    );
}

#[test]
fn test_namespace_condition_referencing_child() {
    let rules = r#"{
        "a": { "applicable si": "a . b > 0" },
        "a . b": 1
    }"#;
    let result = engine(rules).evaluate("a . b").unwrap();
    assert_eq!(result.node_value, Some(LiteralValue::Number(Decimal::ONE)));
}

#[test]
fn test_default_does_not_report_missing() {
    let rules = r#"{
        "x": { "par défaut": 0 },
        "y": { "somme": ["x", 3] }
    }"#;
    let result = engine(rules).evaluate("y").unwrap();
    assert_eq!(result.node_value, Some(LiteralValue::Number(Decimal::from(3))));
    assert!(result.missing_variables.is_empty());
    assert_eq!(
        result.traversed_variables,
        vec!["x".to_string(), "y".to_string()]
    );
}

#[test]
fn test_missing_input_reported_after_default_was_used() {
    let rules = r#"{
        "x": null,
        "a": { "valeur": "x", "par défaut": 0 },
        "t": "a + x"
    }"#;
    let result = engine(rules).evaluate("t").unwrap();
    assert_eq!(result.status, ValueStatus::Missing);
    assert_eq!(result.missing_variables, vec!["x".to_string()]);

    // The default alone still reports nothing
    let result = engine(rules).evaluate("a").unwrap();
    assert_eq!(result.node_value, Some(LiteralValue::Number(Decimal::ZERO)));
    assert!(result.missing_variables.is_empty());
}

#[test]
fn test_cached_rule_replays_missing_inputs() {
    let rules = r#"{
        "revenu": {},
        "impôt": "revenu * 10 %",
        "total": "impôt + impôt * 2"
    }"#;
    let result = engine(rules).evaluate("total").unwrap();
    assert_eq!(result.status, ValueStatus::Missing);
    assert_eq!(result.missing_variables, vec!["revenu".to_string()]);
}

#[test]
fn test_scale_with_missing_base() {
    let rules = r#"{
        "revenu": {},
        "impôt": {
            "barème": {
                "assiette": "revenu",
                "tranches": [{ "taux": "10 %", "plafond": 1000 }, { "taux": "20 %" }]
            }
        }
    }"#;
    assert!(engine(rules).evaluate("impôt").unwrap().is_missing());
}
