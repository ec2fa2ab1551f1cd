//! Source positions for parse diagnostics
//!
//! Parsing works on byte offsets. Line and column are only computed when an
//! error is reported, so the hot path never tracks them.

use std::fmt;

/// Location in source text
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePosition {
    /// Byte offset into the input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number in characters (1-based)
    pub column: usize,
}

impl SourcePosition {
    /// Resolve a byte offset into a line/column position
    ///
    /// Offsets past the end of `input` are clamped to the end. Offsets inside a
    /// multi-byte character count as that character's column.
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let mut line = 1;
        let mut line_start = 0;
        for (i, b) in input.as_bytes()[..offset].iter().enumerate() {
            if *b == b'\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        let column = String::from_utf8_lossy(&input.as_bytes()[line_start..offset])
            .chars()
            .count()
            + 1;
        Self { offset, line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
