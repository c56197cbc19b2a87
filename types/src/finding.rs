//! Typed findings parsed out of raw tool output.
//!
//! Parsers turn an execution's stdout/stderr into a [`ToolReport`]: zero
//! or more [`Finding`]s plus, for a successful format run, the formatted
//! content. Display precedence across categories is fixed: execution
//! failures > syntax errors > format issues > lint issues. Lower
//! categories are still collected; they are just never blocking.

use crate::diagnostic::Severity;
use serde::{Deserialize, Serialize};

/// A parse failure reported by the formatter. Fatal: blocks formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    /// 0-indexed line.
    pub line: u32,
    /// 0-indexed column.
    pub column: u32,
    pub message: String,
}

/// A cosmetic formatting difference reported in check mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatIssue {
    /// Unified diff between the document and its formatted form.
    pub diff: String,
}

/// A single linter finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintIssue {
    /// 0-indexed line.
    pub line: u32,
    /// 0-indexed column.
    pub column: u32,
    pub severity: Severity,
    /// Tool-assigned code (e.g. "SC2034").
    pub code: String,
    pub message: String,
}

/// One finding, tagged by category so consumers can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Syntax(SyntaxError),
    Format(FormatIssue),
    Lint(LintIssue),
}

impl Finding {
    /// Severity this finding carries when rendered as a diagnostic.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Finding::Syntax(_) => Severity::Error,
            Finding::Format(_) => Severity::Warning,
            Finding::Lint(issue) => issue.severity,
        }
    }
}

/// Typed result of one tool execution, produced by a parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolReport {
    findings: Vec<Finding>,
    formatted: Option<String>,
}

impl ToolReport {
    /// A run that completed with nothing to report.
    #[must_use]
    pub fn clean() -> Self {
        Self::default()
    }

    /// A successful format run carrying the formatted document.
    #[must_use]
    pub fn formatted(content: impl Into<String>) -> Self {
        Self {
            findings: Vec::new(),
            formatted: Some(content.into()),
        }
    }

    #[must_use]
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            formatted: None,
        }
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    #[must_use]
    pub fn formatted_content(&self) -> Option<&str> {
        self.formatted.as_deref()
    }

    #[must_use]
    pub fn into_formatted(self) -> Option<String> {
        self.formatted
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    #[must_use]
    pub fn has_syntax_errors(&self) -> bool {
        self.syntax_errors().next().is_some()
    }

    pub fn syntax_errors(&self) -> impl Iterator<Item = &SyntaxError> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Syntax(err) => Some(err),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax(line: u32, msg: &str) -> Finding {
        Finding::Syntax(SyntaxError {
            line,
            column: 0,
            message: msg.to_string(),
        })
    }

    fn lint(severity: Severity) -> Finding {
        Finding::Lint(LintIssue {
            line: 0,
            column: 0,
            severity,
            code: "SC0000".to_string(),
            message: "test".to_string(),
        })
    }

    #[test]
    fn test_finding_severity_by_category() {
        assert_eq!(syntax(0, "bad").severity(), Severity::Error);
        assert_eq!(
            Finding::Format(FormatIssue {
                diff: String::new()
            })
            .severity(),
            Severity::Warning
        );
        assert_eq!(lint(Severity::Info).severity(), Severity::Info);
    }

    #[test]
    fn test_clean_report() {
        let report = ToolReport::clean();
        assert!(report.is_clean());
        assert!(!report.has_syntax_errors());
        assert!(report.formatted_content().is_none());
    }

    #[test]
    fn test_formatted_report_is_clean() {
        let report = ToolReport::formatted("echo hi\n");
        assert!(report.is_clean());
        assert_eq!(report.formatted_content(), Some("echo hi\n"));
        assert_eq!(report.into_formatted(), Some("echo hi\n".to_string()));
    }

    #[test]
    fn test_syntax_errors_filter() {
        let report = ToolReport::from_findings(vec![
            lint(Severity::Warning),
            syntax(13, "if statement must end with \"fi\""),
            lint(Severity::Error),
        ]);
        assert!(report.has_syntax_errors());
        let collected: Vec<_> = report.syntax_errors().collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].line, 13);
    }
}
