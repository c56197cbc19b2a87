//! Host-facing diagnostic records.
//!
//! A [`Diagnostic`] is the unit handed to the host's diagnostic sink:
//! a span in the document, a severity, a stable code, the name of the
//! backend that produced it, and a human-readable message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for a diagnostic or lint finding.
///
/// Ordering follows declaration order, so sorting puts errors first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A half-open region of a document. Lines and columns are 0-indexed;
/// `end_column` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    #[must_use]
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A single-character span at `(line, column)`.
    #[must_use]
    pub fn caret(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column.saturating_add(1))
    }

    /// A span covering one whole line of length `len`.
    #[must_use]
    pub fn line(line: u32, len: u32) -> Self {
        Self::new(line, 0, line, len)
    }
}

/// A single diagnostic produced by one backend for one document.
///
/// Fields are private; consumers read via accessors. Line/column are
/// 0-indexed internally and converted to 1-indexed only for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    span: Span,
    severity: Severity,
    /// Stable machine-readable code (e.g. "SC2034", "syntax-error").
    code: String,
    /// Name of the backend that produced this diagnostic.
    source: String,
    message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        span: Span,
        severity: Severity,
        code: impl Into<String>,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            span,
            severity,
            code: code.into(),
            source: source.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    /// Format as `path:line:col: severity: message [code]` (1-indexed),
    /// the same shape the linter's gcc output format uses.
    #[must_use]
    pub fn display_with_path(&self, path: &str) -> String {
        format!(
            "{}:{}:{}: {}: {} [{}]",
            path,
            self.span.start_line + 1,
            self.span.start_column + 1,
            self.severity.label(),
            first_line(&self.message),
            self.code,
        )
    }
}

/// Multi-line messages (e.g. spawn failures with install hints) collapse
/// to their first line in single-line display contexts.
fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Severity ───────────────────────────────────────────────────────

    #[test]
    fn test_severity_label() {
        assert_eq!(Severity::Error.label(), "error");
        assert_eq!(Severity::Warning.label(), "warning");
        assert_eq!(Severity::Info.label(), "info");
    }

    #[test]
    fn test_is_error() {
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert!(!Severity::Info.is_error());
    }

    #[test]
    fn test_severity_sorts_errors_first() {
        let mut severities = vec![Severity::Info, Severity::Error, Severity::Warning];
        severities.sort();
        assert_eq!(
            severities,
            vec![Severity::Error, Severity::Warning, Severity::Info]
        );
    }

    #[test]
    fn test_severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
        let parsed: Severity = serde_json::from_str("\"info\"").unwrap();
        assert_eq!(parsed, Severity::Info);
    }

    // ── Span ───────────────────────────────────────────────────────────

    #[test]
    fn test_caret_span_is_one_char_wide() {
        let span = Span::caret(2, 4);
        assert_eq!(span, Span::new(2, 4, 2, 5));
    }

    #[test]
    fn test_line_span_starts_at_column_zero() {
        let span = Span::line(7, 42);
        assert_eq!(span, Span::new(7, 0, 7, 42));
    }

    #[test]
    fn test_caret_span_saturates_at_max_column() {
        let span = Span::caret(0, u32::MAX);
        assert_eq!(span.end_column, u32::MAX);
    }

    // ── Diagnostic ─────────────────────────────────────────────────────

    #[test]
    fn test_display_with_path() {
        let diag = Diagnostic::new(
            Span::caret(2, 4),
            Severity::Warning,
            "SC2034",
            "shellcheck",
            "var is unused",
        );
        // 0-indexed internally, 1-indexed for display.
        assert_eq!(
            diag.display_with_path("script.sh"),
            "script.sh:3:5: warning: var is unused [SC2034]"
        );
    }

    #[test]
    fn test_display_collapses_multiline_message() {
        let diag = Diagnostic::new(
            Span::line(0, 10),
            Severity::Error,
            "execution-error",
            "shfmt",
            "`shfmt` is not installed\n\nCommand: shfmt -i 2 -",
        );
        assert_eq!(
            diag.display_with_path("a.sh"),
            "a.sh:1:1: error: `shfmt` is not installed [execution-error]"
        );
    }
}
