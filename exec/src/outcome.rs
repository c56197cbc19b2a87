//! Execution outcomes as values.
//!
//! [`execute`](crate::execute) never fails at the signature level; every
//! failure mode is a variant of [`ExecError`] inside the returned
//! [`ExecReport`]. The exit code and the error are mutually exclusive by
//! construction of [`ExecOutcome`].

/// Why a spawn failed, classified from the OS error at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnErrorKind {
    /// The binary was not found on PATH (ENOENT).
    NotInstalled,
    /// The binary exists but is not executable by us (EACCES).
    PermissionDenied,
    Other,
}

/// A failed execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("Execution cancelled: {command_line}")]
    Cancelled { command_line: String },
    #[error("Execution timed out after {timeout_ms}ms: {command_line}")]
    Timeout { command_line: String, timeout_ms: u64 },
    #[error("{message}")]
    Spawn {
        kind: SpawnErrorKind,
        message: String,
    },
}

impl ExecError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecError::Cancelled { .. })
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }

    #[must_use]
    pub fn spawn_kind(&self) -> Option<SpawnErrorKind> {
        match self {
            ExecError::Spawn { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Terminal state of one execution: a normal exit or a classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The process ran to completion. Signal-killed children report `-1`.
    Exited(i32),
    Failed(ExecError),
}

/// Everything captured from one execution.
///
/// Partial stdout/stderr is retained on timeout and cancellation, so a
/// consumer can still inspect whatever the tool managed to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecReport {
    command_line: String,
    stdout: String,
    stderr: String,
    outcome: ExecOutcome,
}

impl ExecReport {
    #[must_use]
    pub fn new(
        command_line: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        outcome: ExecOutcome,
    ) -> Self {
        Self {
            command_line: command_line.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            outcome,
        }
    }

    /// A completed run with the given exit code.
    #[must_use]
    pub fn exited(
        command_line: impl Into<String>,
        code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::new(command_line, stdout, stderr, ExecOutcome::Exited(code))
    }

    /// A failed run with no captured output.
    #[must_use]
    pub fn failed(command_line: impl Into<String>, error: ExecError) -> Self {
        Self::new(command_line, "", "", ExecOutcome::Failed(error))
    }

    /// The full command string, for log and diagnostic messages.
    #[must_use]
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    #[must_use]
    pub fn outcome(&self) -> &ExecOutcome {
        &self.outcome
    }

    /// Exit code of a completed run; `None` exactly when `error` is set.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match &self.outcome {
            ExecOutcome::Exited(code) => Some(*code),
            ExecOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExecError> {
        match &self.outcome {
            ExecOutcome::Exited(_) => None,
            ExecOutcome::Failed(error) => Some(error),
        }
    }

    /// True for a clean zero exit.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code() == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_and_error_are_mutually_exclusive() {
        let ok = ExecReport::exited("shfmt -", 0, "out", "");
        assert_eq!(ok.exit_code(), Some(0));
        assert!(ok.error().is_none());
        assert!(ok.success());

        let failed = ExecReport::failed(
            "shfmt -",
            ExecError::Cancelled {
                command_line: "shfmt -".to_string(),
            },
        );
        assert_eq!(failed.exit_code(), None);
        assert!(failed.error().is_some());
        assert!(!failed.success());
    }

    #[test]
    fn test_nonzero_exit_is_not_success_and_not_error() {
        let report = ExecReport::exited("shellcheck -f gcc -", 1, "findings", "");
        assert_eq!(report.exit_code(), Some(1));
        assert!(report.error().is_none());
        assert!(!report.success());
    }

    #[test]
    fn test_error_display_messages() {
        let cancelled = ExecError::Cancelled {
            command_line: "shfmt -i 2 -".to_string(),
        };
        assert_eq!(cancelled.to_string(), "Execution cancelled: shfmt -i 2 -");

        let timeout = ExecError::Timeout {
            command_line: "shellcheck -f gcc -".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(
            timeout.to_string(),
            "Execution timed out after 30000ms: shellcheck -f gcc -"
        );
    }

    #[test]
    fn test_classification_helpers() {
        let timeout = ExecError::Timeout {
            command_line: "x".to_string(),
            timeout_ms: 1,
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_cancelled());
        assert_eq!(timeout.spawn_kind(), None);

        let spawn = ExecError::Spawn {
            kind: SpawnErrorKind::NotInstalled,
            message: "`shfmt` is not installed".to_string(),
        };
        assert_eq!(spawn.spawn_kind(), Some(SpawnErrorKind::NotInstalled));
    }
}
