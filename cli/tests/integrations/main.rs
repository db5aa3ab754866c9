mod evaluate;
mod list;
mod show;

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const IMPOT_RULES: &str = r#"{
    "personne . revenu": { "titre": "Revenu annuel", "unité": "€/an" },
    "personne . nombre d'enfants": {},
    "seuil d'imposition": "10000 €/an",
    "impôt": {
        "titre": "Impôt sur le revenu",
        "applicable si": "personne . revenu >= seuil d'imposition",
        "barème": {
            "assiette": "personne . revenu",
            "tranches": [
                { "taux": "0 %", "plafond": "plafond première tranche" },
                { "taux": "40 %" }
            ]
        },
        "unité": "€/an"
    },
    "impôt . plafond première tranche": {
        "valeur": "50000 €/an + personne . nombre d'enfants * 5000 €/an",
        "unité": "€/an"
    }
}"#;

/// Write `content` to `name` inside a fresh temporary directory
pub fn write_rules(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}
