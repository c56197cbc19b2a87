//! ShellCheck backend: linter invocation, output parsing, and the plugin.
//!
//! ShellCheck is asked for gcc-style output (`-f gcc`), one finding per
//! line. Some failure modes bypass that format and print the tty-style
//! `In FILE line N:` header instead, so a fallback pattern catches those.

use crate::convert::{execution_diagnostic, findings_to_diagnostics};
use crate::plugin::{PluginError, PluginFut, RunOptions, ToolPlugin};
use bosun_exec::{execute, ExecError, ExecReport, ExecRequest};
use bosun_types::{CheckReport, DocumentSnapshot, Finding, LintIssue, Severity, ToolReport};
use regex::Regex;
use std::sync::LazyLock;

static GCC_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^:]+:(\d+):(\d+): (error|warning|note): (.+?) \[(SC\d+)\]$").unwrap()
});

static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^In .+ line (\d+):$").unwrap());

const PROBE_SNIPPET: &str = "# probe\n";

const INSTALL_HINT: &str = "Install it with `brew install shellcheck` or \
    `apt-get install shellcheck`, or see https://www.shellcheck.net for other options.";

/// Map one ShellCheck execution onto a typed report.
///
/// Lines that match neither pattern are skipped; empty output means a
/// clean document. Both streams are scanned, since findings and failure
/// headers do not land on the same one consistently.
#[must_use]
pub fn parse_shellcheck(report: &ExecReport) -> ToolReport {
    if report.error().is_some() {
        return ToolReport::clean();
    }

    let mut findings = Vec::new();
    for line in report.stdout().lines().chain(report.stderr().lines()) {
        if let Some(issue) = parse_gcc_line(line) {
            findings.push(Finding::Lint(issue));
        } else if let Some(issue) = parse_header_line(line) {
            findings.push(Finding::Lint(issue));
        }
    }
    ToolReport::from_findings(findings)
}

fn parse_gcc_line(line: &str) -> Option<LintIssue> {
    let caps = GCC_LINE_RE.captures(line.trim_end())?;
    let row: u32 = caps[1].parse().ok()?;
    let column: u32 = caps[2].parse().ok()?;
    let severity = match &caps[3] {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        _ => Severity::Info,
    };
    // ShellCheck reports 1-based positions.
    Some(LintIssue {
        line: row.saturating_sub(1),
        column: column.saturating_sub(1),
        severity,
        code: caps[5].to_string(),
        message: caps[4].to_string(),
    })
}

fn parse_header_line(line: &str) -> Option<LintIssue> {
    let trimmed = line.trim();
    let caps = HEADER_LINE_RE.captures(trimmed)?;
    let row: u32 = caps[1].parse().ok()?;
    Some(LintIssue {
        line: row.saturating_sub(1),
        column: 0,
        severity: Severity::Error,
        code: "shellcheck-error".to_string(),
        message: trimmed.to_string(),
    })
}

/// Tool path configuration bound to a [`ShellcheckPlugin`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellcheckConfig {
    /// Executable to invoke; a bare name resolves through PATH.
    pub path: String,
}

impl Default for ShellcheckConfig {
    fn default() -> Self {
        Self {
            path: "shellcheck".to_string(),
        }
    }
}

/// The ShellCheck backend. Check-only; it never formats.
#[derive(Debug, Clone)]
pub struct ShellcheckPlugin {
    config: ShellcheckConfig,
}

impl ShellcheckPlugin {
    pub const NAME: &'static str = "shellcheck";

    #[must_use]
    pub fn new(config: ShellcheckConfig) -> Self {
        Self { config }
    }

    fn request(&self, text: &str, opts: &RunOptions) -> ExecRequest {
        ExecRequest::new(self.config.path.as_str())
            .args(["-f", "gcc", "-"])
            .stdin(text)
            .timeout(opts.timeout())
            .cancel_token(opts.cancel().clone())
    }

    async fn run_check(&self, doc: &DocumentSnapshot, opts: &RunOptions) -> CheckReport {
        let report = execute(self.request(doc.text(), opts)).await;
        match report.error() {
            Some(error) if error.is_cancelled() || error.is_timeout() => {
                tracing::debug!(%error, "shellcheck check inconclusive");
                CheckReport::inconclusive()
            }
            Some(error) => CheckReport::from_diagnostics(vec![execution_diagnostic(
                doc,
                Self::NAME,
                error,
                report.command_line(),
                INSTALL_HINT,
            )]),
            None => {
                let parsed = parse_shellcheck(&report);
                CheckReport::from_diagnostics(findings_to_diagnostics(
                    doc,
                    Self::NAME,
                    parsed.findings(),
                ))
            }
        }
    }

    async fn run_probe(&self) -> bool {
        let opts = RunOptions::new();
        let report = execute(self.request(PROBE_SNIPPET, &opts)).await;
        // Findings on the probe snippet are expected; only a spawn
        // failure means the tool is unavailable.
        if report.error().and_then(ExecError::spawn_kind).is_some() {
            tracing::debug!(path = %self.config.path, "shellcheck unavailable");
            return false;
        }
        true
    }
}

impl ToolPlugin for ShellcheckPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn display_name(&self) -> &'static str {
        "Shell linter (ShellCheck)"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["sh", "bash", "dash", "ksh"]
    }

    fn probe<'a>(&'a self) -> PluginFut<'a, bool> {
        Box::pin(self.run_probe())
    }

    fn check<'a>(
        &'a self,
        doc: &'a DocumentSnapshot,
        opts: &'a RunOptions,
    ) -> PluginFut<'a, Result<CheckReport, PluginError>> {
        Box::pin(async move { Ok(self.run_check(doc, opts).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bosun_types::{DocumentId, Span};

    fn doc(text: &str) -> DocumentSnapshot {
        DocumentSnapshot::new(DocumentId::new("script.sh"), text)
    }

    fn lint_findings(report: &ToolReport) -> Vec<&LintIssue> {
        report
            .findings()
            .iter()
            .filter_map(|finding| match finding {
                Finding::Lint(issue) => Some(issue),
                _ => None,
            })
            .collect()
    }

    // ── Parser ─────────────────────────────────────────────────────────

    #[test]
    fn test_gcc_line_parses_to_zero_based_issue() {
        let report = ExecReport::exited(
            "shellcheck -f gcc -",
            1,
            "script.sh:3:5: warning: var is unused [SC2034]\n",
            "",
        );
        let parsed = parse_shellcheck(&report);
        let issues = lint_findings(&parsed);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].column, 4);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].code, "SC2034");
        assert_eq!(issues[0].message, "var is unused");
    }

    #[test]
    fn test_stdin_marker_file_name_parses() {
        let report = ExecReport::exited(
            "shellcheck -f gcc -",
            1,
            "-:1:8: error: Double quote to prevent globbing and word splitting. [SC2086]\n",
            "",
        );
        let issues_report = parse_shellcheck(&report);
        let issues = lint_findings(&issues_report);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 0);
        assert_eq!(issues[0].column, 7);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_note_maps_to_info() {
        let report = ExecReport::exited(
            "shellcheck -f gcc -",
            1,
            "-:2:1: note: Consider using { cmd1; cmd2; }. [SC2129]\n",
            "",
        );
        let parsed = parse_shellcheck(&report);
        assert_eq!(lint_findings(&parsed)[0].severity, Severity::Info);
    }

    #[test]
    fn test_header_fallback_becomes_error_issue() {
        let report = ExecReport::exited(
            "shellcheck -f gcc -",
            2,
            "",
            "In script.sh line 3:\nsome context\n",
        );
        let parsed = parse_shellcheck(&report);
        let issues = lint_findings(&parsed);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].column, 0);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].code, "shellcheck-error");
        assert_eq!(issues[0].message, "In script.sh line 3:");
    }

    #[test]
    fn test_findings_from_both_streams_in_order() {
        let report = ExecReport::exited(
            "shellcheck -f gcc -",
            1,
            "-:1:1: warning: a [SC1001]\n",
            "-:2:1: error: b [SC1002]\n",
        );
        let parsed = parse_shellcheck(&report);
        let issues = lint_findings(&parsed);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, "SC1001");
        assert_eq!(issues[1].code, "SC1002");
    }

    #[test]
    fn test_unmatched_lines_are_skipped() {
        let report = ExecReport::exited(
            "shellcheck -f gcc -",
            1,
            "random banner\n-:1:1: warning: real [SC2000]\n\ntrailing garbage\n",
            "",
        );
        let parsed = parse_shellcheck(&report);
        assert_eq!(parsed.findings().len(), 1);
    }

    #[test]
    fn test_empty_output_is_clean() {
        let report = ExecReport::exited("shellcheck -f gcc -", 0, "", "");
        assert!(parse_shellcheck(&report).is_clean());
    }

    #[test]
    fn test_execution_failure_parses_to_empty_report() {
        let report = ExecReport::failed(
            "shellcheck -f gcc -",
            ExecError::Cancelled {
                command_line: "shellcheck -f gcc -".to_string(),
            },
        );
        assert!(parse_shellcheck(&report).is_clean());
    }

    #[test]
    fn test_zero_positions_saturate() {
        let report = ExecReport::exited("shellcheck -f gcc -", 1, "-:0:0: error: odd [SC1000]\n", "");
        let parsed = parse_shellcheck(&report);
        let issues = lint_findings(&parsed);
        assert_eq!(issues[0].line, 0);
        assert_eq!(issues[0].column, 0);
    }

    // ── Adapter behavior ───────────────────────────────────────────────

    #[test]
    fn test_request_shape() {
        let plugin = ShellcheckPlugin::new(ShellcheckConfig::default());
        let request = plugin.request("echo hi\n", &RunOptions::new());
        assert_eq!(request.command_line(), "shellcheck -f gcc -");
    }

    #[tokio::test]
    async fn test_check_missing_binary_yields_install_diagnostic() {
        let plugin = ShellcheckPlugin::new(ShellcheckConfig {
            path: "bosun-test-missing-shellcheck".to_string(),
        });
        let report = plugin
            .run_check(&doc("echo hi\n"), &RunOptions::new())
            .await;

        assert!(report.has_errors());
        let diags = report.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].source(), "shellcheck");
        assert!(diags[0].message().contains("is not installed"));
        assert!(diags[0].message().contains("shellcheck.net"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_with_fake_tool_maps_spans() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shellcheck");
        std::fs::write(
            &path,
            "#!/bin/sh\ncat >/dev/null\nprintf '%s\\n' '-:2:1: warning: x appears unused [SC2034]'\nexit 1\n",
        )
        .unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();

        let plugin = ShellcheckPlugin::new(ShellcheckConfig {
            path: path.display().to_string(),
        });
        let report = plugin
            .run_check(&doc("echo hi\nx=1\n"), &RunOptions::new())
            .await;

        assert!(report.is_conclusive());
        assert!(!report.has_errors());
        let diags = report.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].span(), Span::caret(1, 0));
        assert_eq!(diags[0].code(), "SC2034");
    }
}
