use crate::{write_rules, IMPOT_RULES};
use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_list_rules() {
    let (_dir, rules) = write_rules("impot.json", IMPOT_RULES);

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("list").arg(&rules);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("impôt . plafond première tranche"))
        .stdout(predicate::str::contains("Impôt sur le revenu"))
        .stdout(predicate::str::contains("€/an"))
        // `personne` is an implied namespace
        .stdout(predicate::str::contains("6 rule(s)"));
}

#[test]
fn test_cli_list_empty_directory() {
    let dir = tempfile::TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("publicodes").unwrap();
    cmd.arg("list").arg(dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No .json rule files found"));
}
