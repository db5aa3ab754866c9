/// Resource limits applied while loading rule sets and evaluating
///
/// Generous enough for real rule sets (the French social security model is
/// a few megabytes of rules) while keeping malicious input bounded.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Maximum size of a rule-set JSON document in bytes
    pub max_rules_bytes: usize,

    /// Maximum nesting depth of expressions and mechanisms
    pub max_expression_depth: usize,

    /// Maximum size of a single situation value in bytes
    pub max_situation_value_bytes: usize,

    /// Maximum evaluation time in milliseconds
    pub max_evaluation_time_ms: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_rules_bytes: 5 * 1024 * 1024, // 5 MB
            max_expression_depth: 100,
            max_situation_value_bytes: 1024, // 1 KB
            max_evaluation_time_ms: 1000,    // 1 second
        }
    }
}

impl ResourceLimits {
    pub fn new() -> Self {
        Self::default()
    }
}
