//! The uniform contract every tool backend is wrapped into.

use bosun_types::{CheckReport, DocumentSnapshot, FormatReport};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Plugin operation future type alias.
pub type PluginFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-run execution parameters handed to every plugin operation.
///
/// The token is shared across every backend taking part in one run, so
/// cancelling it stops the whole fan-out; the timeout applies to each
/// subprocess individually.
#[derive(Debug, Clone)]
pub struct RunOptions {
    cancel: CancellationToken,
    timeout: Duration,
}

impl RunOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            timeout: bosun_exec::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types for plugin operations.
///
/// The built-in backends never fail (executor failures become
/// diagnostics or inconclusive reports); these exist for the registry
/// boundary, where a failing plugin is attributed instead of aborting
/// the whole run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    #[error("Check failed: {message}")]
    CheckFailed { message: String },
    #[error("Format failed: {message}")]
    FormatFailed { message: String },
}

/// One checking/formatting backend wrapping one external tool.
///
/// Implementations are stateless with respect to documents; tool path
/// and style flags are bound at construction. Operations borrow `self`,
/// so a single instance serves concurrent runs.
pub trait ToolPlugin: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &'static str;
    fn display_name(&self) -> &'static str;
    fn version(&self) -> &'static str;
    /// File extensions this backend understands, without the dot.
    fn supported_extensions(&self) -> &'static [&'static str];
    /// Whether [`format`](Self::format) can produce a replacement.
    fn can_format(&self) -> bool {
        false
    }
    /// Availability probe; activation requires one success. Availability
    /// is not re-verified until the next activation cycle.
    fn probe<'a>(&'a self) -> PluginFut<'a, bool>;
    /// Diagnose one document snapshot.
    fn check<'a>(
        &'a self,
        doc: &'a DocumentSnapshot,
        opts: &'a RunOptions,
    ) -> PluginFut<'a, Result<CheckReport, PluginError>>;
    /// Produce a whole-document replacement. Backends without format
    /// support keep the default no-op.
    fn format<'a>(
        &'a self,
        doc: &'a DocumentSnapshot,
        opts: &'a RunOptions,
    ) -> PluginFut<'a, Result<FormatReport, PluginError>> {
        let _ = (doc, opts);
        Box::pin(async { Ok(FormatReport::unchanged()) })
    }
    /// Called after activation succeeds.
    fn on_activate(&self) {}
    /// Called when the plugin leaves the active set.
    fn on_deactivate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use bosun_types::DocumentId;

    struct CheckOnly;

    impl ToolPlugin for CheckOnly {
        fn name(&self) -> &'static str {
            "check-only"
        }

        fn display_name(&self) -> &'static str {
            "Check Only"
        }

        fn version(&self) -> &'static str {
            "0.0.0"
        }

        fn supported_extensions(&self) -> &'static [&'static str] {
            &["sh"]
        }

        fn probe<'a>(&'a self) -> PluginFut<'a, bool> {
            Box::pin(async { true })
        }

        fn check<'a>(
            &'a self,
            _doc: &'a DocumentSnapshot,
            _opts: &'a RunOptions,
        ) -> PluginFut<'a, Result<CheckReport, PluginError>> {
            Box::pin(async { Ok(CheckReport::clean()) })
        }
    }

    #[test]
    fn test_run_options_defaults() {
        let opts = RunOptions::new();
        assert_eq!(opts.timeout(), bosun_exec::DEFAULT_TIMEOUT);
        assert!(!opts.cancel().is_cancelled());
    }

    #[tokio::test]
    async fn test_default_format_is_a_no_op() {
        let plugin = CheckOnly;
        assert!(!plugin.can_format());

        let doc = DocumentSnapshot::new(DocumentId::new("a.sh"), "echo hi\n");
        let report = plugin.format(&doc, &RunOptions::new()).await.unwrap();
        assert!(!report.has_replacement());
        assert!(report.diagnostics().is_empty());
    }
}
