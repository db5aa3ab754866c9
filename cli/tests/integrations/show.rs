use crate::{write_rules, IMPOT_RULES};
use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_show_rule() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("show").arg(&rules).arg("impôt . plafond première tranche");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Value: 50000 €/an + personne . nombre d'enfants * 5000 €/an",
        ))
        .stdout(predicate::str::contains("Unit: €/an"))
        .stdout(predicate::str::contains("Depends on:"))
        .stdout(predicate::str::contains("personne . nombre d'enfants"))
        .stdout(predicate::str::contains("Used by:"));
}

#[test]
fn test_cli_show_rule_metadata() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("show").arg(&rules).arg("impôt");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Title: Impôt sur le revenu"))
        .stdout(predicate::str::contains(
            "Applicable if: personne . revenu >= seuil d'imposition",
        ))
        .stdout(predicate::str::contains("Value: (mechanism)"));
}

#[test]
fn test_cli_show_unknown_rule() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("show").arg(&rules).arg("taxe");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Rule 'taxe' not found"));
}
