// Ports - Interface definitions (contracts) for external collaborators

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::errors::*;
use crate::engine::command::ToolCommand;

/// Port for the external transcoding tool
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Run one invocation to completion
    ///
    /// Success means exit status 0; output-file verification is left to the
    /// caller. Implementations must honour the command's timeout and stop
    /// the process when `cancel` fires.
    async fn run(&self, command: &ToolCommand, cancel: &CancelToken) -> Result<ToolOutput, DomainError>;
}

/// Captured result of a successful tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stderr: String,
}

/// Port for probing media duration
#[async_trait]
pub trait DurationProbePort: Send + Sync {
    /// Total media duration in seconds
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError>;
}

/// Port for the natural-language-to-plan translator
#[async_trait]
pub trait TranslatorPort: Send + Sync {
    /// Turn an editing instruction into a raw text blob holding a plan
    async fn translate(&self, instruction: &str) -> Result<String, DomainError>;
}

/// Caller side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Create a handle and the token observed by the pipeline
    pub fn pair() -> (Self, CancelToken) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, CancelToken { receiver })
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Pipeline side of a cancellation signal
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Token that is never triggered
    pub fn never() -> Self {
        let (_sender, receiver) = watch::channel(false);
        Self { receiver }
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once cancellation is requested
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Sender gone without cancelling: never resolves.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Fail fast when cancellation was requested
    pub fn check(&self) -> Result<(), DomainError> {
        if self.is_cancelled() {
            Err(DomainError::Cancelled)
        } else {
            Ok(())
        }
    }
}
