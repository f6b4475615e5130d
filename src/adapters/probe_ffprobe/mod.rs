//! FFprobe adapter for media duration probing

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::adapters::exec_ffmpeg::resolve_binary;
use crate::domain::errors::*;
use crate::ports::*;
use crate::utils::path::truncate_tail;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    binary: PathBuf,
    timeout: Duration,
}

impl FFprobeAdapter {
    /// Create a new adapter for the configured binary
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

/// Parse the single value printed by `format=duration`
pub fn parse_duration_output(stdout: &str) -> Result<f64, DomainError> {
    let value = stdout.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("");
    match value.parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration > 0.0 => Ok(duration),
        _ => Err(DomainError::ProbeUnavailable(format!(
            "unexpected duration output '{}'",
            value
        ))),
    }
}

#[async_trait]
impl DurationProbePort for FFprobeAdapter {
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        let binary = resolve_binary(&self.binary)
            .map_err(|e| DomainError::ProbeUnavailable(e.to_string()))?;

        debug!("Probing duration of {}", file_path.display());
        let child = Command::new(&binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                DomainError::ProbeUnavailable(format!(
                    "ffprobe timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| DomainError::ProbeUnavailable(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::ProbeUnavailable(format!(
                "ffprobe exited with {:?}: {}",
                output.status.code(),
                truncate_tail(stderr.trim(), 500)
            )));
        }

        let duration = parse_duration_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Probed duration {:.3}s", duration);
        Ok(duration)
    }
}
