use crate::{Engine, Evaluation, LiteralValue, PublicodesError, Situation, Unit};
use rust_decimal::Decimal;
use std::str::FromStr;

fn evaluate(rules: &str, target: &str) -> Evaluation {
    Engine::from_json(rules)
        .unwrap_or_else(|e| panic!("Failed to load rules: {}", e))
        .evaluate(target)
        .unwrap_or_else(|e| panic!("Failed to evaluate '{}': {}", target, e))
}

fn evaluate_with(rules: &str, situation: Situation, target: &str) -> Evaluation {
    Engine::from_json(rules)
        .unwrap()
        .with_situation(situation)
        .unwrap()
        .evaluate(target)
        .unwrap_or_else(|e| panic!("Failed to evaluate '{}': {}", target, e))
}

fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

fn number(text: &str) -> Option<LiteralValue> {
    Some(LiteralValue::Number(dec(text)))
}

#[test]
fn test_sum_skips_not_applicable_terms() {
    let rules = r#"{
        "a": 1,
        "b": "2 €",
        "c": { "applicable si": "non", "valeur": 5 },
        "total": { "somme": ["a", "b", "c"] }
    }"#;
    let result = evaluate(rules, "total");
    assert_eq!(result.node_value, number("3"));
    assert_eq!(result.unit, Some(Unit::simple("€")));
}

#[test]
fn test_empty_sum_is_zero() {
    let rules = r#"{
        "c": { "applicable si": "non", "valeur": 5 },
        "total": { "somme": ["c"] }
    }"#;
    assert_eq!(evaluate(rules, "total").node_value, number("0"));
}

#[test]
fn test_product() {
    let result = evaluate(r#"{ "x": { "produit": ["2", "3 €", "50 %"] } }"#, "x");
    assert_eq!(result.node_value, number("3"));
    assert_eq!(result.unit, Some(Unit::simple("€")));
}

#[test]
fn test_product_with_not_applicable_factor() {
    let rules = r#"{
        "c": { "non applicable si": "oui", "valeur": 5 },
        "x": { "produit": ["2", "c"] }
    }"#;
    let result = evaluate(rules, "x");
    assert_eq!(result.node_value, None);
    assert!(!result.is_applicable());
}

#[test]
fn test_scale_with_multiplier() {
    let rules = r#"{
        "revenu": "5000 €",
        "plafond sécurité sociale": "1000 €",
        "cotisation": {
            "barème": {
                "assiette": "revenu",
                "multiplicateur": "plafond sécurité sociale",
                "tranches": [
                    { "taux": "10 %", "plafond": 1 },
                    { "taux": "5 %", "plafond": 4 },
                    { "taux": "1 %" }
                ]
            }
        }
    }"#;
    let result = evaluate(rules, "cotisation");
    assert_eq!(result.node_value, number("260"));
    assert_eq!(result.unit, Some(Unit::simple("€")));
}

#[test]
fn test_scale_below_first_ceiling() {
    let rules = r#"{
        "impôt": {
            "barème": {
                "assiette": "20000 €",
                "tranches": [
                    { "taux": "10 %", "plafond": "30000 €" },
                    { "taux": "40 %" }
                ]
            }
        }
    }"#;
    assert_eq!(evaluate(rules, "impôt").node_value, number("2000"));
}

#[test]
fn test_scale_rejects_decreasing_ceilings() {
    let rules = r#"{
        "impôt": {
            "barème": {
                "assiette": "20000 €",
                "tranches": [
                    { "taux": "10 %", "plafond": "10000 €" },
                    { "taux": "20 %", "plafond": "5000 €" },
                    { "taux": "40 %" }
                ]
            }
        }
    }"#;
    let result = Engine::from_json(rules).unwrap().evaluate("impôt");
    assert!(matches!(result, Err(PublicodesError::Runtime(_))));
}

#[test]
fn test_variations_first_matching_branch() {
    let rules = r#"{
        "âge": 30,
        "tarif": {
            "variations": [
                { "si": "âge < 18", "alors": "5 €" },
                { "si": "âge < 65", "alors": "10 €" },
                { "sinon": "7 €" }
            ]
        }
    }"#;
    assert_eq!(evaluate(rules, "tarif").node_value, number("10"));
}

#[test]
fn test_variations_without_matching_branch() {
    let rules = r#"{
        "tarif": { "variations": [{ "si": "non", "alors": 1 }] }
    }"#;
    let result = evaluate(rules, "tarif");
    assert_eq!(result.node_value, None);
    assert!(!result.is_applicable());
}

#[test]
fn test_all_and_any_conditions() {
    let rules = r#"{
        "a": "oui",
        "b": "non",
        "toutes": { "toutes ces conditions": ["a", "b"] },
        "une": { "une de ces conditions": ["a", "b"] }
    }"#;
    assert_eq!(
        evaluate(rules, "toutes").node_value,
        Some(LiteralValue::Boolean(false))
    );
    assert_eq!(
        evaluate(rules, "une").node_value,
        Some(LiteralValue::Boolean(true))
    );
}

#[test]
fn test_ceiling_and_floor() {
    let rules = r#"{
        "haut": { "valeur": "150 €", "plafond": "100 €" },
        "bas": { "valeur": "50 €", "plancher": "100 €" },
        "entre": { "valeur": "80 €", "plancher": "50 €", "plafond": "100 €" }
    }"#;
    assert_eq!(evaluate(rules, "haut").node_value, number("100"));
    assert_eq!(evaluate(rules, "bas").node_value, number("100"));
    assert_eq!(evaluate(rules, "entre").node_value, number("80"));
}

#[test]
fn test_ceiling_converts_units() {
    let rules = r#"{
        "x": { "valeur": "24000 €/an", "plafond": "1500 €/mois" }
    }"#;
    let result = evaluate(rules, "x");
    assert_eq!(result.node_value, number("18000"));
    assert_eq!(result.unit.map(|u| u.to_string()), Some("€/an".to_string()));
}

#[test]
fn test_not_applicable_ceiling_leaves_value() {
    let rules = r#"{
        "limite": { "applicable si": "non", "valeur": "10 €" },
        "x": { "valeur": "150 €", "plafond": "limite" }
    }"#;
    assert_eq!(evaluate(rules, "x").node_value, number("150"));
}

#[test]
fn test_rounding() {
    let rules = r#"{
        "entier": { "valeur": "10 / 4", "arrondi": "oui" },
        "deux décimales": { "valeur": "10 / 3", "arrondi": 2 },
        "sans arrondi": { "valeur": "10 / 4", "arrondi": "non" }
    }"#;
    assert_eq!(evaluate(rules, "entier").node_value, number("3"));
    assert_eq!(evaluate(rules, "deux décimales").node_value, number("3.33"));
    assert_eq!(evaluate(rules, "sans arrondi").node_value, number("2.5"));
}

#[test]
fn test_declared_unit_converts_value() {
    let rules = r#"{
        "salaire": { "valeur": "3000 €/mois", "unité": "€/an" }
    }"#;
    let result = evaluate(rules, "salaire");
    assert_eq!(result.node_value, number("36000"));
    assert_eq!(result.unit.map(|u| u.to_string()), Some("€/an".to_string()));
}

#[test]
fn test_nested_unit_conversion() {
    let rules = r#"{
        "x": { "valeur": { "valeur": "1 an", "unité": "mois" } }
    }"#;
    let result = evaluate(rules, "x");
    assert_eq!(result.node_value, number("12"));
    assert_eq!(result.unit, Some(Unit::simple("mois")));
}

#[test]
fn test_predicates() {
    let rules = r#"{
        "fermé": { "applicable si": "non", "valeur": 1 },
        "question": null,
        "a": { "est non applicable": "fermé" },
        "b": { "est applicable": "fermé" },
        "c": { "est défini": "question" },
        "d": { "est non défini": "question" }
    }"#;
    assert_eq!(evaluate(rules, "a").node_value, Some(LiteralValue::Boolean(true)));
    assert_eq!(evaluate(rules, "b").node_value, Some(LiteralValue::Boolean(false)));

    let undefined = evaluate(rules, "c");
    assert_eq!(undefined.node_value, Some(LiteralValue::Boolean(false)));
    assert!(undefined.missing_variables.is_empty());
    assert_eq!(evaluate(rules, "d").node_value, Some(LiteralValue::Boolean(true)));

    let defined = evaluate_with(rules, Situation::new().with("question", 3), "c");
    assert_eq!(defined.node_value, Some(LiteralValue::Boolean(true)));
}

#[test]
fn test_nested_applicability_mechanisms() {
    let rules = r#"{
        "x": { "valeur": { "valeur": 10, "applicable si": "non" } },
        "y": { "valeur": { "valeur": 10, "non applicable si": "non" } }
    }"#;
    assert_eq!(evaluate(rules, "x").node_value, None);
    assert_eq!(evaluate(rules, "y").node_value, number("10"));
}

#[test]
fn test_default_value() {
    let rules = r#"{
        "x": { "par défaut": "5 €" },
        "y": "x * 2"
    }"#;
    let result = evaluate(rules, "y");
    assert_eq!(result.node_value, number("10"));
    assert!(result.missing_variables.is_empty());

    let result = evaluate_with(rules, Situation::new().with("x", "7 €"), "y");
    assert_eq!(result.node_value, number("14"));
}

#[test]
fn test_negation() {
    assert_eq!(evaluate(r#"{ "x": "-(2 € - 5 €)" }"#, "x").node_value, number("3"));
}

#[test]
fn test_runtime_errors() {
    let cases = [
        (r#"{ "x": "1 / 0" }"#, "Division by zero"),
        (r#"{ "x": "1 € + 1 enfant" }"#, "Cannot apply addition"),
        (r#"{ "x": "oui + 1" }"#, "must be a number"),
        (r#"{ "x": { "applicable si": 3, "valeur": 1 } }"#, "must be a boolean"),
        (r#"{ "x": { "valeur": "3 €", "unité": "enfant" } }"#, "has unit 'enfant'"),
    ];
    for (rules, expected) in cases {
        match Engine::from_json(rules).unwrap().evaluate("x") {
            Err(PublicodesError::Runtime(msg)) => assert!(
                msg.contains(expected),
                "Expected '{}' in '{}'",
                expected,
                msg
            ),
            other => panic!("Expected runtime error for {}, got {:?}", rules, other),
        }
    }
}

#[test]
fn test_numeric_overflow_is_a_runtime_error() {
    let declared_unit = r#"{ "revenu": { "unité": "€/an" } }"#;
    let engine = Engine::from_json(declared_unit)
        .unwrap()
        .with_situation(Situation::new().with("revenu", "70000000000000000000000000000 €/mois"))
        .unwrap();
    match engine.evaluate("revenu") {
        Err(PublicodesError::Runtime(msg)) => assert!(msg.contains("overflow"), "{}", msg),
        other => panic!("Expected overflow error, got {:?}", other),
    }

    let scale = r#"{
        "impôt": {
            "barème": {
                "assiette": "70000000000000000000000000000 €",
                "tranches": [{ "taux": "200 %" }]
            }
        }
    }"#;
    match Engine::from_json(scale).unwrap().evaluate("impôt") {
        Err(PublicodesError::Runtime(msg)) => assert!(msg.contains("overflow"), "{}", msg),
        other => panic!("Expected overflow error, got {:?}", other),
    }
}
