mod error_formatter;
mod formatter;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use formatter::Formatter;
use publicodes::{Engine, Situation};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "publicodes")]
#[command(about = "Evaluate publicodes rule sets from the command line.")]
#[command(
    long_about = "Publicodes rules describe tax and social computations declaratively.\nThe CLI loads precompiled rule sets (JSON) and evaluates rules or expressions against a situation given as NAME=VALUE pairs."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a rule or an expression
    ///
    /// Loads the rule set, applies the situation and prints the value with
    /// its unit, the missing inputs and the rules visited.
    Evaluate {
        /// Rule set: a JSON file, or a directory scanned for .json files
        rules: PathBuf,
        /// Rule name or expression to evaluate
        ///
        /// Examples:
        ///   "impôt sur le revenu à deux tranches"
        ///   "personne . revenu * 10 %"
        target: String,
        /// Situation entries (format: name=value)
        ///
        /// Examples: "personne . revenu=230000 €/an", "personne . nombre d'enfants=0"
        situation: Vec<String>,
        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all rules with their title and unit
    List {
        /// Rule set: a JSON file, or a directory scanned for .json files
        rules: PathBuf,
    },
    /// Show one rule: metadata, conditions and dependencies
    Show {
        /// Rule set: a JSON file, or a directory scanned for .json files
        rules: PathBuf,
        /// Name of the rule to show
        rule: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Evaluate {
            rules,
            target,
            situation,
            json,
        } => evaluate_command(rules, target, situation, *json),
        Commands::List { rules } => list_command(rules),
        Commands::Show { rules, rule } => show_command(rules, rule),
    };

    if let Err(e) = result {
        if let Some(publicodes_err) = e.downcast_ref::<publicodes::PublicodesError>() {
            eprintln!("{}", error_formatter::format_error(publicodes_err));
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn evaluate_command(rules: &Path, target: &str, entries: &[String], json: bool) -> Result<()> {
    let situation = parse_situation(entries)?;
    let engine = load_rules(rules)?.with_situation(situation)?;
    let evaluation = engine.evaluate(target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        let formatter = Formatter::default();
        print!("{}", formatter.format_evaluation(&evaluation, engine.situation()));
    }

    Ok(())
}

fn list_command(rules: &Path) -> Result<()> {
    let engine = load_rules(rules)?;
    let formatter = Formatter::default();
    print!("{}", formatter.format_rule_list(&engine));
    Ok(())
}

fn show_command(rules: &Path, rule: &str) -> Result<()> {
    let engine = load_rules(rules)?;
    let Some(definition) = engine.get_rule(rule) else {
        return Err(publicodes::PublicodesError::UnknownRule(rule.trim().to_string()).into());
    };

    let formatter = Formatter::default();
    print!("{}", formatter.format_rule(definition, &engine));
    Ok(())
}

/// Parse `name=value` pairs; the value is kept as an expression string
fn parse_situation(entries: &[String]) -> Result<Situation> {
    entries
        .iter()
        .map(|entry| {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid situation entry '{}': expected name=value", entry))?;
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                bail!("Invalid situation entry '{}': expected name=value", entry);
            }
            Ok((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Load a rule set from a JSON file, or from every .json file under a directory
fn load_rules(path: &Path) -> Result<Engine> {
    if path.is_file() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Engine::from_json(&content)?);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.path().extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(entry.into_path());
        }
    }
    if files.is_empty() {
        bail!("No .json rule files found in {}", path.display());
    }
    files.sort();

    let mut merged = Map::new();
    let mut origins: HashMap<String, &Path> = HashMap::new();
    for file in &files {
        let content = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", file.display()))?;
        let Value::Object(rules) = value else {
            bail!("{} must contain a JSON object of rules", file.display());
        };

        debug!(file = %file.display(), rules = rules.len(), "rule file read");
        for (name, body) in rules {
            if let Some(first) = origins.get(&name) {
                bail!(
                    "Rule '{}' is defined in both {} and {}",
                    name,
                    first.display(),
                    file.display()
                );
            }
            origins.insert(name.clone(), file);
            merged.insert(name, body);
        }
    }

    Ok(Engine::from_value(&Value::Object(merged))?)
}
