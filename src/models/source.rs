//! Source files and text spans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Absolute start offset and length of a source range, in bytes.
///
/// An empty span marks a synthetic node that has no text of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

impl TextSpan {
    pub const EMPTY: TextSpan = TextSpan { start: 0, length: 0 };

    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Span covering `start..end`. `end` before `start` yields an empty span at `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, other: &TextSpan) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// Smallest span covering both. Empty spans do not widen the result.
    pub fn union(&self, other: &TextSpan) -> TextSpan {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        TextSpan::from_bounds(self.start.min(other.start), self.end().max(other.end()))
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end())
    }
}

/// 1-based line/column rendering of a [`TextSpan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColumnTextSpan {
    pub begin_line: usize,
    pub begin_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl fmt::Display for LineColumnTextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.begin_line, self.begin_column, self.end_line, self.end_column
        )
    }
}

/// A source file a UST was built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the scanned root
    pub path: PathBuf,

    /// Full text, may be empty when the front-end did not ship it
    #[serde(default)]
    pub code: String,

    #[serde(skip)]
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, code: impl Into<String>) -> Self {
        let code = code.into();
        let line_starts = compute_line_starts(&code);
        Self {
            path: path.into(),
            code,
            line_starts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuild the line index after deserialization.
    pub(crate) fn reindex(&mut self) {
        self.line_starts = compute_line_starts(&self.code);
    }

    /// Source text covered by `span`, if it lies on char boundaries inside the file.
    pub fn text(&self, span: TextSpan) -> Option<&str> {
        self.code.get(span.start..span.end())
    }

    /// Convert an absolute offset to a 1-based (line, column) pair.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        if self.line_starts.is_empty() {
            return (1, offset + 1);
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    pub fn line_column_span(&self, span: TextSpan) -> LineColumnTextSpan {
        let (begin_line, begin_column) = self.line_column(span.start);
        let (end_line, end_column) = self.line_column(span.end());
        LineColumnTextSpan {
            begin_line,
            begin_column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn compute_line_starts(code: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(code.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let span = TextSpan::new(4, 6);
        assert_eq!(span.end(), 10);
        assert!(span.contains(&TextSpan::new(5, 2)));
        assert!(!span.contains(&TextSpan::new(8, 4)));
        assert!(TextSpan::from_bounds(7, 3).is_empty());
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = TextSpan::new(10, 5);
        assert_eq!(a.union(&TextSpan::EMPTY), a);
        assert_eq!(a.union(&TextSpan::new(2, 3)), TextSpan::new(2, 13));
    }

    #[test]
    fn test_line_column() {
        let file = SourceFile::new("a.js", "ab\ncd\n\nef");
        assert_eq!(file.line_column(0), (1, 1));
        assert_eq!(file.line_column(3), (2, 1));
        assert_eq!(file.line_column(4), (2, 2));
        assert_eq!(file.line_column(7), (4, 1));

        let lc = file.line_column_span(TextSpan::new(3, 2));
        assert_eq!(lc.to_string(), "2:1-2:3");
        assert_eq!(file.text(TextSpan::new(3, 2)), Some("cd"));
    }
}
