//! AST infrastructure types
//!
//! Metadata shared by the parser and the evaluator:
//! - `Span` for tracking locations inside an expression string
//! - `LineIndex` for turning byte offsets into lines and columns
//! - `DepthTracker` for bounding expression nesting while parsing

use crate::error::PublicodesError;

/// Span representing a location in an expression string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

/// Line starts and character offsets of one expression string
///
/// Built once per parsed string so every node's span is looked up in
/// logarithmic time instead of rescanning the input.
pub struct LineIndex {
    line_starts: Vec<usize>,
    chars_before: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut chars_before = Vec::with_capacity(text.len() + 1);
        for (count, (offset, c)) in text.char_indices().enumerate() {
            chars_before.extend(std::iter::repeat(count).take(c.len_utf8()));
            if c == '\n' {
                line_starts.push(offset + 1);
            }
        }
        chars_before.push(text.chars().count());
        Self {
            line_starts,
            chars_before,
        }
    }

    /// Span of the byte range `start..end`, with a 1-based line and column
    pub fn span(&self, start: usize, end: usize) -> Span {
        let line = self.line_starts.partition_point(|&offset| offset <= start);
        let line_start = self
            .line_starts
            .get(line.saturating_sub(1))
            .copied()
            .unwrap_or(0);
        let chars_at = |offset: usize| {
            self.chars_before
                .get(offset)
                .copied()
                .unwrap_or(self.chars_before.len().saturating_sub(1))
        };
        Span {
            start,
            end,
            line: line.max(1),
            col: chars_at(start).saturating_sub(chars_at(line_start)) + 1,
        }
    }
}

/// Tracks how deeply expressions and mechanisms are nested while parsing
pub struct DepthTracker {
    depth: usize,
    max_depth: usize,
}

impl DepthTracker {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    pub fn push(&mut self) -> Result<(), PublicodesError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(PublicodesError::ResourceLimitExceeded {
                limit_name: "max_expression_depth".to_string(),
                limit_value: self.max_depth.to_string(),
                actual_value: self.depth.to_string(),
                suggestion: "Split the expression into intermediate rules".to_string(),
            });
        }
        Ok(())
    }

    pub fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Undo `levels` calls to `push`
    pub fn release(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
