//! Checker error types.

use thiserror::Error;

/// Errors that can occur while running the quality gate.
#[derive(Debug, Error)]
pub enum DoclifyError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error.
    #[error("File error: {0}")]
    File(String),

    /// Custom rules file error.
    #[error("Rules error: {0}")]
    Rules(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DoclifyError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a file error.
    pub fn file(message: impl Into<String>) -> Self {
        Self::File(message.into())
    }

    /// Creates a custom rules error.
    pub fn rules(message: impl Into<String>) -> Self {
        Self::Rules(message.into())
    }
}
