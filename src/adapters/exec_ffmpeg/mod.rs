//! FFmpeg execution adapter
//!
//! Runs one `ToolCommand` as an ffmpeg subprocess. The process is bounded
//! by the command's timeout, killed when the run is cancelled, and killed
//! on drop if the awaiting future is abandoned.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::engine::command::ToolCommand;
use crate::ports::*;
use crate::utils::path::truncate_tail;

/// Characters of stderr kept on failure
pub const STDERR_LIMIT: usize = 2000;

/// ffmpeg-backed transcoder
pub struct FFmpegAdapter {
    binary: PathBuf,
}

impl FFmpegAdapter {
    /// Create an adapter for the configured binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn resolve(&self) -> Result<PathBuf, DomainError> {
        resolve_binary(&self.binary)
    }
}

/// Locate a tool binary, searching PATH for bare names
pub fn resolve_binary(binary: &Path) -> Result<PathBuf, DomainError> {
    if binary.components().count() > 1 {
        return if binary.is_file() {
            Ok(binary.to_path_buf())
        } else {
            Err(DomainError::ToolUnavailable(format!(
                "{} does not exist",
                binary.display()
            )))
        };
    }
    which::which(binary).map_err(|e| {
        DomainError::ToolUnavailable(format!("{} not found in PATH: {}", binary.display(), e))
    })
}

#[async_trait]
impl TranscodePort for FFmpegAdapter {
    async fn run(&self, command: &ToolCommand, cancel: &CancelToken) -> Result<ToolOutput, DomainError> {
        cancel.check()?;
        let binary = self.resolve()?;
        let args = command.build_args();
        debug!("Running {}: {} {}", command.operation(), binary.display(), args.join(" "));

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::ToolUnavailable(format!("failed to start {}: {}", binary.display(), e))
            })?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let status = match wait_for_completion(&mut child, command, cancel).await {
            Ok(status) => status,
            Err(err) => {
                // Grandchildren may still hold the pipe open.
                if let Some(task) = stderr_task {
                    task.abort();
                }
                return Err(err);
            }
        };

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            debug!("{} finished", command.operation());
            Ok(ToolOutput { stderr })
        } else {
            warn!(
                "{} exited with {:?}: {}",
                command.operation(),
                status.code(),
                truncate_tail(stderr.trim(), 500)
            );
            Err(DomainError::ToolFailed {
                operation: command.operation().to_string(),
                exit_code: status.code(),
                stderr: truncate_tail(stderr.trim(), STDERR_LIMIT),
            })
        }
    }
}

/// Wait for the child, killing it on timeout or cancellation
async fn wait_for_completion(
    child: &mut Child,
    command: &ToolCommand,
    cancel: &CancelToken,
) -> Result<std::process::ExitStatus, DomainError> {
    let deadline = sleep_or_forever(command.timeout());
    tokio::pin!(deadline);

    tokio::select! {
        status = child.wait() => status.map_err(|e| DomainError::FsFail(format!(
            "waiting for {}: {}",
            command.operation(),
            e
        ))),
        _ = &mut deadline => {
            let seconds = command.timeout().map(|t| t.as_secs()).unwrap_or_default();
            warn!("{} timed out after {} seconds, killing process", command.operation(), seconds);
            let _ = child.kill().await;
            Err(DomainError::ToolTimeout {
                operation: command.operation().to_string(),
                seconds,
            })
        }
        _ = cancel.cancelled() => {
            info!("{} cancelled, killing process", command.operation());
            let _ = child.kill().await;
            Err(DomainError::Cancelled)
        }
    }
}

async fn sleep_or_forever(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending::<()>().await,
    }
}
