//! Spawn one external tool and see it through to a terminal state.

use crate::outcome::{ExecError, ExecOutcome, ExecReport, SpawnErrorKind};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default per-execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// One tool invocation: command, arguments, optional stdin content, a
/// timeout, and a cooperative cancellation token. Built once per call.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    command: String,
    args: Vec<String>,
    stdin: Option<String>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl ExecRequest {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            stdin: None,
            timeout: DEFAULT_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Content written to the child's stdin; the pipe is closed afterward.
    #[must_use]
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The full command string, e.g. `shfmt -i 2 -d -`.
    #[must_use]
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Run one external command to completion.
///
/// Never fails at the signature level: spawn errors, timeouts, and
/// cancellation all come back as [`ExecOutcome::Failed`] inside the
/// report. Exactly one terminal path fires; whichever of normal exit,
/// timeout, or cancellation happens first wins and the child is killed
/// on the losing paths. Partial output is retained in every case.
pub async fn execute(request: ExecRequest) -> ExecReport {
    let command_line = request.command_line();
    let ExecRequest {
        command,
        args,
        stdin,
        timeout,
        cancel,
    } = request;

    if cancel.is_cancelled() {
        tracing::debug!(command = %command_line, "cancelled before start");
        return ExecReport::failed(
            command_line.clone(),
            ExecError::Cancelled { command_line },
        );
    }

    let mut cmd = Command::new(&command);
    cmd.args(&args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            let error = classify_spawn_error(&command, &err);
            tracing::warn!(command = %command_line, %error, "spawn failed");
            return ExecReport::failed(command_line, error);
        }
    };
    tracing::debug!(command = %command_line, "spawned");

    // Writer and readers run as tasks so a tool that fills its pipes while
    // we are still feeding stdin cannot deadlock the call.
    if let Some(input) = stdin
        && let Some(mut handle) = child.stdin.take()
    {
        tokio::spawn(async move {
            // The child may exit without draining stdin; that is not our error.
            let _ = handle.write_all(input.as_bytes()).await;
            let _ = handle.shutdown().await;
        });
    }

    let stdout_task = child.stdout.take().map(|s| tokio::spawn(read_to_end(s)));
    let stderr_task = child.stderr.take().map(|s| tokio::spawn(read_to_end(s)));

    // Exactly one terminal path wins the race; the losers are dropped
    // before the child is touched again.
    enum Ended {
        Exited(std::io::Result<std::process::ExitStatus>),
        TimedOut,
        Cancelled,
    }

    let ended = tokio::select! {
        status = child.wait() => Ended::Exited(status),
        () = tokio::time::sleep(timeout) => Ended::TimedOut,
        () = cancel.cancelled() => Ended::Cancelled,
    };

    let outcome = match ended {
        Ended::Exited(Ok(status)) => {
            let code = status.code().unwrap_or(-1);
            tracing::debug!(command = %command_line, code, "exited");
            ExecOutcome::Exited(code)
        }
        Ended::Exited(Err(err)) => ExecOutcome::Failed(classify_spawn_error(&command, &err)),
        Ended::TimedOut => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            let timeout_ms = timeout.as_millis() as u64;
            tracing::warn!(command = %command_line, timeout_ms, "timed out, killed");
            ExecOutcome::Failed(ExecError::Timeout {
                command_line: command_line.clone(),
                timeout_ms,
            })
        }
        Ended::Cancelled => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            tracing::debug!(command = %command_line, "cancelled, killed");
            ExecOutcome::Failed(ExecError::Cancelled {
                command_line: command_line.clone(),
            })
        }
    };

    // The child is gone on every path above, so the pipes are at EOF and
    // the reader tasks finish with whatever was captured.
    let stdout = collect(stdout_task).await;
    let stderr = collect(stderr_task).await;

    ExecReport::new(command_line, stdout, stderr, outcome)
}

async fn read_to_end<R: AsyncReadExt + Unpin>(mut reader: R) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf).await;
    buf
}

async fn collect(task: Option<JoinHandle<Vec<u8>>>) -> String {
    match task {
        Some(task) => String::from_utf8_lossy(&task.await.unwrap_or_default()).into_owned(),
        None => String::new(),
    }
}

fn classify_spawn_error(command: &str, err: &std::io::Error) -> ExecError {
    let (kind, message) = match err.kind() {
        std::io::ErrorKind::NotFound => (
            SpawnErrorKind::NotInstalled,
            format!("`{command}` is not installed"),
        ),
        std::io::ErrorKind::PermissionDenied => (
            SpawnErrorKind::PermissionDenied,
            format!("Permission denied when running `{command}`"),
        ),
        _ => (
            SpawnErrorKind::Other,
            format!("Failed to run `{command}`: {err}"),
        ),
    };
    ExecError::Spawn { kind, message }
}
