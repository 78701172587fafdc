//! Output comparison against golden files.
//!
//! The default policy is exact byte equality of the captured stdout and the
//! golden text. Normalization is applied identically to both sides before
//! comparing, since capture boundaries (a trailing newline, CRLF from a
//! Windows-built interpreter) are a common source of spurious mismatches.

use std::fmt;

use serde::Serialize;

/// Normalization applied to both sides before comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalization {
    /// Fold `\r\n` into `\n`.
    pub line_endings: bool,
    /// Strip a single trailing newline.
    pub trailing_newline: bool,
}

/// Result of comparing actual output against a golden file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub passed: bool,
    /// Present exactly when `passed` is false.
    pub diff: Option<DiffSummary>,
}

/// First point of divergence between expected and actual output.
///
/// Offsets and columns are byte-based, measured after normalization. Lines
/// and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub byte_offset: usize,
    pub line: usize,
    pub column: usize,
    /// The line containing the divergence, from each side. Empty when the
    /// divergence is past that side's last line.
    pub expected_line: String,
    pub actual_line: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "output diverges at byte {} (line {}, column {})",
            self.byte_offset, self.line, self.column
        )?;
        // Debug-quote the lines so whitespace differences are visible.
        writeln!(f, "expected line: {:?}", self.expected_line)?;
        writeln!(f, "  actual line: {:?}", self.actual_line)?;
        writeln!(f, "--- expected ---")?;
        writeln!(f, "{}", self.expected)?;
        writeln!(f, "--- actual ---")?;
        write!(f, "{}", self.actual)
    }
}

/// Compare actual output against the golden text.
pub fn compare(expected: &str, actual: &str, normalization: Normalization) -> Comparison {
    let expected = normalize(expected, normalization);
    let actual = normalize(actual, normalization);

    if expected == actual {
        Comparison {
            passed: true,
            diff: None,
        }
    } else {
        Comparison {
            passed: false,
            diff: Some(divergence(&expected, &actual)),
        }
    }
}

fn normalize(text: &str, normalization: Normalization) -> String {
    let mut out = if normalization.line_endings {
        text.replace("\r\n", "\n")
    } else {
        text.to_string()
    };

    if normalization.trailing_newline {
        if out.ends_with('\n') {
            out.pop();
        }
        if out.ends_with('\r') {
            out.pop();
        }
    }

    out
}

/// Locate the first differing byte. Precondition: `expected != actual`.
fn divergence(expected: &str, actual: &str) -> DiffSummary {
    let e = expected.as_bytes();
    let a = actual.as_bytes();

    let byte_offset = e
        .iter()
        .zip(a.iter())
        .position(|(x, y)| x != y)
        .unwrap_or_else(|| e.len().min(a.len()));

    let prefix = &e[..byte_offset];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    let column = byte_offset - line_start + 1;

    DiffSummary {
        byte_offset,
        line,
        column,
        expected_line: nth_line(expected, line),
        actual_line: nth_line(actual, line),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn nth_line(text: &str, line: usize) -> String {
    text.lines().nth(line - 1).unwrap_or_default().to_string()
}
