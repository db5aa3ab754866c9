use crate::{write_rules, IMPOT_RULES};
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_cli_evaluate_rule() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate")
        .arg(&rules)
        .arg("impôt")
        .arg("personne . revenu=230000 €/an")
        .arg("personne . nombre d'enfants=0");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("impôt = 72000"))
        .stdout(predicate::str::contains("€/an"))
        .stdout(predicate::str::contains("personne . revenu"));
}

#[test]
fn test_cli_evaluate_not_applicable() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate")
        .arg(&rules)
        .arg("impôt")
        .arg("personne . revenu=4000 €/an")
        .arg("personne . nombre d'enfants=0");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("non applicable"));
}

#[test]
fn test_cli_evaluate_reports_missing_inputs() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate").arg(&rules).arg("impôt");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("manquant"))
        .stdout(predicate::str::contains("Missing inputs"))
        .stdout(predicate::str::contains("personne . nombre d'enfants"));
}

#[test]
fn test_cli_evaluate_json_output() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate")
        .arg(&rules)
        .arg("impôt")
        .arg("personne . revenu=230000 €/an")
        .arg("personne . nombre d'enfants=2")
        .arg("--json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let value: rust_decimal::Decimal = json["node_value"].as_str().unwrap().parse().unwrap();
    assert_eq!(value, rust_decimal::Decimal::from(68000));
    assert_eq!(json["status"], "defined");
    assert_eq!(json["unit"], "€/an");
}

#[test]
fn test_cli_evaluate_expression() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate")
        .arg(&rules)
        .arg("personne . revenu / 12")
        .arg("personne . revenu=24000 €/an");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2000"));
}

#[test]
fn test_cli_evaluate_directory() {
    let (dir, _) = write_rules(
        "personne.json",
        r#"{ "personne . revenu": { "unité": "€/an" } }"#,
    );
    fs::create_dir_all(dir.path().join("impots")).unwrap();
    fs::write(
        dir.path().join("impots/taxe.json"),
        r#"{ "taxe": "personne . revenu * 10 %" }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate")
        .arg(dir.path())
        .arg("taxe")
        .arg("personne . revenu=1000 €/an");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("taxe = 100"));
}

#[test]
fn test_cli_duplicate_rule_across_files() {
    let (dir, _) = write_rules("a.json", r#"{ "taxe": 1 }"#);
    fs::write(dir.path().join("b.json"), r#"{ "taxe": 2 }"#).unwrap();

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate").arg(dir.path()).arg("taxe");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Rule 'taxe' is defined in both"));
}

#[test]
fn test_cli_unknown_situation_rule() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate")
        .arg(&rules)
        .arg("impôt")
        .arg("personne . âge=40");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Situation error for 'personne . âge'"));
}

#[test]
fn test_cli_invalid_situation_entry() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate").arg(&rules).arg("impôt").arg("revenu");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("expected name=value"));
}

#[test]
fn test_cli_unknown_target() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate").arg(&rules).arg("taxe foncière");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_parse_error_handling() {
    let (_dir, rules) = write_rules("broken.json", r#"{ "a": "1 +* 2" }"#);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate").arg(&rules).arg("a");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn test_cli_runtime_error() {
    let (_dir, rules) = write_rules("units.json", r#"{ "a": "1 € + 1 an" }"#);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("evaluate").arg(&rules).arg("a");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Runtime error"));
}
