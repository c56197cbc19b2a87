//! shfmt backend: formatter invocation, output parsing, and the plugin.
//!
//! shfmt reads the document from stdin (`-` marker). In format mode the
//! formatted text comes back on stdout; in check mode (`-d`) a unified
//! diff does. Parse failures arrive on stderr as a single
//! `<standard input>:LINE:COL: message` line with a non-zero exit.

use crate::convert::{execution_diagnostic, findings_to_diagnostics};
use crate::plugin::{PluginError, PluginFut, RunOptions, ToolPlugin};
use bosun_exec::{execute, ExecError, ExecReport, ExecRequest};
use bosun_types::{
    CheckReport, DocumentSnapshot, Finding, FormatIssue, FormatReport, SyntaxError, ToolReport,
};
use regex::Regex;
use std::sync::LazyLock;

static SYNTAX_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^:]+:(\d+):(\d+): (.+)$").unwrap());

const PROBE_SNIPPET: &str = "# probe\n";

const INSTALL_HINT: &str = "Install it with `brew install shfmt` or `apt-get install shfmt`, \
    or see https://github.com/mvdan/sh#shfmt for other options.";

/// What we asked shfmt to produce, which decides how stdout is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShfmtMode {
    /// The formatted document on stdout.
    Format,
    /// A diff against the canonical form on stdout (`-d`).
    Check,
}

/// Style configuration bound to a [`ShfmtPlugin`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShfmtConfig {
    /// Executable to invoke; a bare name resolves through PATH.
    pub path: String,
    /// Spaces per indent level; `None` keeps tabs.
    pub indent: Option<u8>,
    /// Start binary operators on the next line (`-bn`).
    pub binary_next_line: bool,
    /// Indent switch cases (`-ci`).
    pub case_indent: bool,
    /// Space after redirect operators (`-sr`).
    pub space_redirects: bool,
    /// Simplify the code (`-s`).
    pub simplify: bool,
}

impl Default for ShfmtConfig {
    fn default() -> Self {
        Self {
            path: "shfmt".to_string(),
            indent: None,
            binary_next_line: false,
            case_indent: false,
            space_redirects: false,
            simplify: false,
        }
    }
}

impl ShfmtConfig {
    fn style_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(width) = self.indent {
            args.push("-i".to_string());
            args.push(width.to_string());
        }
        if self.binary_next_line {
            args.push("-bn".to_string());
        }
        if self.case_indent {
            args.push("-ci".to_string());
        }
        if self.space_redirects {
            args.push("-sr".to_string());
        }
        if self.simplify {
            args.push("-s".to_string());
        }
        args
    }
}

/// Map one shfmt execution onto a typed report.
///
/// Best-effort: execution failures and unrecognizable output both come
/// back empty rather than failing, so a tool upgrade that changes the
/// output shape degrades to "nothing found".
#[must_use]
pub fn parse_shfmt(report: &ExecReport, mode: ShfmtMode) -> ToolReport {
    if report.error().is_some() {
        return ToolReport::clean();
    }

    if mode == ShfmtMode::Format && report.success() {
        return ToolReport::formatted(report.stdout());
    }

    // A parse failure yields exactly one syntax error; a diff that may
    // also be present is subsumed by it.
    if let Some(error) = first_syntax_error(report.stderr()) {
        return ToolReport::from_findings(vec![Finding::Syntax(error)]);
    }

    if mode == ShfmtMode::Check && !report.stdout().is_empty() {
        return ToolReport::from_findings(vec![Finding::Format(FormatIssue {
            diff: report.stdout().to_string(),
        })]);
    }

    ToolReport::clean()
}

fn first_syntax_error(stderr: &str) -> Option<SyntaxError> {
    for line in stderr.lines() {
        if let Some(caps) = SYNTAX_LINE_RE.captures(line) {
            let (Some(row), Some(column)) = (parse_u32(&caps[1]), parse_u32(&caps[2])) else {
                continue;
            };
            // shfmt reports 1-based positions.
            return Some(SyntaxError {
                line: row.saturating_sub(1),
                column: column.saturating_sub(1),
                message: caps[3].to_string(),
            });
        }
    }
    None
}

fn parse_u32(digits: &str) -> Option<u32> {
    digits.parse().ok()
}

/// The shfmt backend. Checks produce format diffs and syntax errors;
/// format produces a whole-document replacement.
#[derive(Debug, Clone)]
pub struct ShfmtPlugin {
    config: ShfmtConfig,
}

impl ShfmtPlugin {
    pub const NAME: &'static str = "shfmt";

    #[must_use]
    pub fn new(config: ShfmtConfig) -> Self {
        Self { config }
    }

    fn request(&self, mode: ShfmtMode, text: &str, opts: &RunOptions) -> ExecRequest {
        let mut request =
            ExecRequest::new(self.config.path.as_str()).args(self.config.style_args());
        if mode == ShfmtMode::Check {
            request = request.arg("-d");
        }
        request
            .arg("-")
            .stdin(text)
            .timeout(opts.timeout())
            .cancel_token(opts.cancel().clone())
    }

    async fn run_check(&self, doc: &DocumentSnapshot, opts: &RunOptions) -> CheckReport {
        let report = execute(self.request(ShfmtMode::Check, doc.text(), opts)).await;
        match report.error() {
            Some(error) if error.is_cancelled() || error.is_timeout() => {
                tracing::debug!(%error, "shfmt check inconclusive");
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
                let parsed = parse_shfmt(&report, ShfmtMode::Check);
                CheckReport::from_diagnostics(findings_to_diagnostics(
                    doc,
                    Self::NAME,
                    parsed.findings(),
                ))
            }
        }
    }

    async fn run_format(&self, doc: &DocumentSnapshot, opts: &RunOptions) -> FormatReport {
        let report = execute(self.request(ShfmtMode::Format, doc.text(), opts)).await;
        if let Some(error) = report.error() {
            if error.is_cancelled() || error.is_timeout() {
                tracing::debug!(%error, "shfmt format inconclusive");
                return FormatReport::unchanged();
            }
            return FormatReport::blocked(vec![execution_diagnostic(
                doc,
                Self::NAME,
                error,
                report.command_line(),
                INSTALL_HINT,
            )]);
        }

        let parsed = parse_shfmt(&report, ShfmtMode::Format);
        if !parsed.is_clean() {
            // Syntax errors block; an unparseable document must not be
            // replaced with whatever the tool left on stdout.
            return FormatReport::blocked(findings_to_diagnostics(
                doc,
                Self::NAME,
                parsed.findings(),
            ));
        }
        match parsed.into_formatted() {
            Some(formatted) if formatted != doc.text() => FormatReport::replaced(formatted),
            _ => FormatReport::unchanged(),
        }
    }

    async fn run_probe(&self) -> bool {
        let opts = RunOptions::new();
        let report = execute(self.request(ShfmtMode::Check, PROBE_SNIPPET, &opts)).await;
        // Only a spawn failure means the tool is unavailable.
        if report.error().and_then(ExecError::spawn_kind).is_some() {
            tracing::debug!(path = %self.config.path, "shfmt unavailable");
            return false;
        }
        true
    }
}

impl ToolPlugin for ShfmtPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn display_name(&self) -> &'static str {
        "Shell formatter (shfmt)"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["sh", "bash", "mksh", "bats"]
    }

    fn can_format(&self) -> bool {
        true
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

    fn format<'a>(
        &'a self,
        doc: &'a DocumentSnapshot,
        opts: &'a RunOptions,
    ) -> PluginFut<'a, Result<FormatReport, PluginError>> {
        Box::pin(async move { Ok(self.run_format(doc, opts).await) })
    }
}
