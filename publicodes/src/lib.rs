//! # Publicodes engine
//!
//! A declarative rule engine for the publicodes language: rules written as
//! dotted names mapped to expressions and mechanisms, evaluated against a
//! situation of input values.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use publicodes::{Engine, PublicodesResult, Situation};
//!
//! fn main() -> PublicodesResult<()> {
//!     let engine = Engine::from_json(r#"{
//!         "salaire": { "unité": "€/mois" },
//!         "impôt": "salaire * 10 %"
//!     }"#)?;
//!
//!     let engine = engine
//!         .shallow_copy()
//!         .with_situation(Situation::new().with("salaire", "3000 €/mois"))?;
//!
//!     let evaluation = engine.evaluate("impôt")?;
//!     println!("{}", evaluation.display_value());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rule sets
//! A rule set is a JSON object mapping dotted rule names (`"personne .
//! revenu"`) to rule bodies. It is loaded once and shared by every engine
//! branched from it.
//!
//! ### Situations
//! A situation binds input values to rules. A bound value replaces the
//! rule's own value, while its applicability conditions and unit still apply.
//!
//! ### No value
//! A rule that does not apply, or whose inputs are missing, has no value.
//! This is distinct from zero.

pub mod analysis;
pub mod ast;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod operation_result;
pub mod parser;
pub mod resource_limits;
pub mod response;
pub mod rule_set;
pub mod semantic;
pub mod situation;
pub mod validator;

pub use ast::Span;
pub use engine::Engine;
pub use error::{ErrorDetails, PublicodesError};
pub use operation_result::OperationResult;
pub use parser::{parse_expression, parse_unit};
pub use resource_limits::ResourceLimits;
pub use response::{Evaluation, ValueStatus};
pub use rule_set::RuleSet;
pub use semantic::*;
pub use situation::{Situation, SituationOptions, SituationValue};
pub use validator::{ValidatedRules, Validator};

/// Result type for publicodes operations
pub type PublicodesResult<T> = Result<T, PublicodesError>;

#[cfg(test)]
mod tests;
