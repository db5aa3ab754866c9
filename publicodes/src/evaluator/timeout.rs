//! Timeout tracking for evaluation
//!
//! Evaluation of a target is bounded by `max_evaluation_time_ms`. The tracker
//! is checked on every expression node.

use crate::{PublicodesError, ResourceLimits};
use std::time::Instant;

pub struct TimeoutTracker {
    start_time: Instant,
}

impl TimeoutTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Check if evaluation has exceeded the timeout limit
    pub fn check_timeout(&self, limits: &ResourceLimits) -> Result<(), PublicodesError> {
        let elapsed_ms = self.start_time.elapsed().as_millis() as u64;
        if elapsed_ms > limits.max_evaluation_time_ms {
            return Err(PublicodesError::ResourceLimitExceeded {
                limit_name: "max_evaluation_time_ms".to_string(),
                limit_value: limits.max_evaluation_time_ms.to_string(),
                actual_value: elapsed_ms.to_string(),
                suggestion: format!(
                    "Evaluation took {}ms, exceeding the limit of {}ms. Simplify the rules or increase the timeout.",
                    elapsed_ms, limits.max_evaluation_time_ms
                ),
            });
        }
        Ok(())
    }
}

impl Default for TimeoutTracker {
    fn default() -> Self {
        Self::new()
    }
}
