//! Setup-time errors for the editplan binary

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors raised before a pipeline run starts
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration file could not be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected schema
    #[error("Invalid config file {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging could not be initialised
    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    /// Plan or text input could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Collaborator could not be constructed
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Output could not be serialised
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for setup operations
pub type AppResult<T> = std::result::Result<T, AppError>;
