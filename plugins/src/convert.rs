//! Conversion from typed findings to host-facing diagnostics.
//!
//! Spans are anchored against the document snapshot: lint findings get a
//! caret at their position, syntax errors cover their whole line, and
//! anything without a meaningful position (format diffs, execution
//! failures) lands on the first line. Out-of-range lines are clamped
//! rather than dropped, since tools occasionally report one past the end.

use bosun_exec::{ExecError, SpawnErrorKind};
use bosun_types::{Diagnostic, DocumentSnapshot, Finding, Severity};

/// Diagnostic code for a tool that could not be executed at all.
pub const EXECUTION_ERROR_CODE: &str = "execution-error";
/// Diagnostic code for a formatter-reported parse failure.
pub const SYNTAX_ERROR_CODE: &str = "syntax-error";
/// Diagnostic code for a document that is not formatted canonically.
pub const FORMAT_ISSUE_CODE: &str = "format-issue";

/// Convert one parsed finding into a diagnostic attributed to `source`.
#[must_use]
pub fn finding_to_diagnostic(
    doc: &DocumentSnapshot,
    source: &str,
    finding: &Finding,
) -> Diagnostic {
    match finding {
        Finding::Syntax(error) => Diagnostic::new(
            doc.line_span(error.line),
            Severity::Error,
            SYNTAX_ERROR_CODE,
            source,
            format!("Syntax error: {}", error.message),
        ),
        Finding::Format(issue) => Diagnostic::new(
            doc.first_line_span(),
            Severity::Warning,
            FORMAT_ISSUE_CODE,
            source,
            format!("File is not properly formatted\n\n{}", issue.diff.trim_end()),
        ),
        Finding::Lint(issue) => Diagnostic::new(
            doc.caret_span(issue.line, issue.column),
            issue.severity,
            issue.code.clone(),
            source,
            issue.message.clone(),
        ),
    }
}

/// Convert a parser's findings in order.
#[must_use]
pub fn findings_to_diagnostics(
    doc: &DocumentSnapshot,
    source: &str,
    findings: &[Finding],
) -> Vec<Diagnostic> {
    findings
        .iter()
        .map(|finding| finding_to_diagnostic(doc, source, finding))
        .collect()
}

/// One first-line error diagnostic for a tool that failed to run.
///
/// A missing binary gets the backend's install hint appended; every
/// variant gets the full command line, so the user can reproduce the
/// failure by hand.
#[must_use]
pub fn execution_diagnostic(
    doc: &DocumentSnapshot,
    source: &str,
    error: &ExecError,
    command_line: &str,
    install_hint: &str,
) -> Diagnostic {
    let mut message = error.to_string();
    if error.spawn_kind() == Some(SpawnErrorKind::NotInstalled) {
        message.push_str("\n\n");
        message.push_str(install_hint);
    }
    message.push_str("\n\nCommand: ");
    message.push_str(command_line);

    Diagnostic::new(
        doc.first_line_span(),
        Severity::Error,
        EXECUTION_ERROR_CODE,
        source,
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bosun_types::{DocumentId, FormatIssue, LintIssue, Span, SyntaxError};

    fn doc(text: &str) -> DocumentSnapshot {
        DocumentSnapshot::new(DocumentId::new("test.sh"), text)
    }

    #[test]
    fn test_syntax_finding_covers_its_line() {
        let doc = doc("echo hi\nif true\n");
        let finding = Finding::Syntax(SyntaxError {
            line: 1,
            column: 0,
            message: "reached EOF without matching token".to_string(),
        });

        let diag = finding_to_diagnostic(&doc, "shfmt", &finding);
        assert_eq!(diag.span(), Span::line(1, 7));
        assert!(diag.is_error());
        assert_eq!(diag.code(), "syntax-error");
        assert_eq!(
            diag.message(),
            "Syntax error: reached EOF without matching token"
        );
    }

    #[test]
    fn test_lint_finding_gets_a_caret() {
        let doc = doc("x=1\necho $x\n");
        let finding = Finding::Lint(LintIssue {
            line: 0,
            column: 0,
            severity: Severity::Warning,
            code: "SC2034".to_string(),
            message: "x appears unused".to_string(),
        });

        let diag = finding_to_diagnostic(&doc, "shellcheck", &finding);
        assert_eq!(diag.span(), Span::caret(0, 0));
        assert_eq!(diag.severity(), Severity::Warning);
        assert_eq!(diag.code(), "SC2034");
        assert_eq!(diag.source(), "shellcheck");
    }

    #[test]
    fn test_out_of_range_line_is_clamped() {
        let doc = doc("echo hi");
        let finding = Finding::Lint(LintIssue {
            line: 40,
            column: 2,
            severity: Severity::Info,
            code: "SC1090".to_string(),
            message: "can't follow non-constant source".to_string(),
        });

        let diag = finding_to_diagnostic(&doc, "shellcheck", &finding);
        assert_eq!(diag.span(), Span::caret(0, 2));
    }

    #[test]
    fn test_format_finding_lands_on_first_line() {
        let doc = doc("echo  hi\n");
        let finding = Finding::Format(FormatIssue {
            diff: "-echo  hi\n+echo hi\n".to_string(),
        });

        let diag = finding_to_diagnostic(&doc, "shfmt", &finding);
        assert_eq!(diag.span(), Span::line(0, 8));
        assert_eq!(diag.severity(), Severity::Warning);
        assert_eq!(diag.code(), "format-issue");
        assert!(diag.message().contains("-echo  hi"));
    }

    #[test]
    fn test_missing_binary_diagnostic_carries_hint_and_command() {
        let doc = doc("echo hi\n");
        let error = ExecError::Spawn {
            kind: SpawnErrorKind::NotInstalled,
            message: "`shfmt` is not installed".to_string(),
        };

        let diag = execution_diagnostic(
            &doc,
            "shfmt",
            &error,
            "shfmt -i 2 -d -",
            "Install it with `brew install shfmt`.",
        );
        assert!(diag.is_error());
        assert_eq!(diag.code(), "execution-error");
        assert_eq!(diag.span(), Span::line(0, 7));
        assert_eq!(
            diag.message(),
            "`shfmt` is not installed\n\nInstall it with `brew install shfmt`.\n\nCommand: shfmt -i 2 -d -"
        );
    }

    #[test]
    fn test_permission_denied_diagnostic_skips_install_hint() {
        let doc = doc("echo hi\n");
        let error = ExecError::Spawn {
            kind: SpawnErrorKind::PermissionDenied,
            message: "Permission denied when running `shellcheck`".to_string(),
        };

        let diag = execution_diagnostic(&doc, "shellcheck", &error, "shellcheck -f gcc -", "hint");
        assert!(!diag.message().contains("hint"));
        assert!(diag.message().ends_with("Command: shellcheck -f gcc -"));
    }
}
