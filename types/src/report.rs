//! Aggregated results returned from check and format runs.

use crate::diagnostic::Diagnostic;
use serde::Serialize;

/// Merged outcome of running `check` across one or more backends.
///
/// `conclusive` distinguishes "the document is clean" from "the run
/// produced no verdict" (every contribution timed out or was cancelled).
/// Inconclusive reports must not overwrite previously published state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
    conclusive: bool,
}

impl CheckReport {
    /// A conclusive run with nothing to report.
    #[must_use]
    pub fn clean() -> Self {
        Self {
            diagnostics: Vec::new(),
            has_errors: false,
            conclusive: true,
        }
    }

    /// A run that produced no verdict (timed out or cancelled).
    #[must_use]
    pub fn inconclusive() -> Self {
        Self {
            diagnostics: Vec::new(),
            has_errors: false,
            conclusive: false,
        }
    }

    /// A conclusive run; `has_errors` is derived from the diagnostics.
    #[must_use]
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let has_errors = diagnostics.iter().any(Diagnostic::is_error);
        Self {
            diagnostics,
            has_errors,
            conclusive: true,
        }
    }

    /// Fold another backend's contribution into this report.
    ///
    /// Diagnostics append in call order, errors accumulate, and the merge
    /// is conclusive as soon as any contribution is.
    pub fn merge(&mut self, other: CheckReport) {
        self.diagnostics.extend(other.diagnostics);
        self.has_errors |= other.has_errors;
        self.conclusive |= other.conclusive;
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    #[must_use]
    pub fn is_conclusive(&self) -> bool {
        self.conclusive
    }
}

/// Outcome of a format request.
///
/// `replacement` is always a whole-document string. Its absence can mean
/// blocked, already formatted, or no capable backend; callers cross-check
/// `diagnostics` to tell those apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatReport {
    replacement: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl FormatReport {
    /// No edit required or possible, nothing to report.
    #[must_use]
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// A successful format producing a whole-document replacement.
    #[must_use]
    pub fn replaced(text: impl Into<String>) -> Self {
        Self {
            replacement: Some(text.into()),
            diagnostics: Vec::new(),
        }
    }

    /// A refused format, carrying the diagnostics that explain why.
    #[must_use]
    pub fn blocked(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            replacement: None,
            diagnostics,
        }
    }

    #[must_use]
    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    #[must_use]
    pub fn into_replacement(self) -> Option<String> {
        self.replacement
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    #[must_use]
    pub fn has_replacement(&self) -> bool {
        self.replacement.is_some()
    }

    /// Whether an error-severity diagnostic prevented formatting.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.replacement.is_none() && self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Per-backend registry entry, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub display_name: String,
    pub version: String,
    pub active: bool,
    pub can_format: bool,
}

/// Registry totals plus per-backend detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub active: usize,
    pub plugins: Vec<PluginInfo>,
}
