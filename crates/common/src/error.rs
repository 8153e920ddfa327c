//! Error types shared across ZenPosture crates.

use std::path::PathBuf;

/// Top-level error type for ZenPosture operations.
#[derive(Debug, thiserror::Error)]
pub enum ZenError {
    #[error("Invalid frame: {message}")]
    Frame { message: String },

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Scoring error: {message}")]
    Scoring { message: String },

    #[error("Session log error: {message}")]
    Session { message: String },

    #[error("Runtime error: {message}")]
    Runtime { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ZenError.
pub type ZenResult<T> = Result<T, ZenError>;

impl ZenError {
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame {
            message: msg.into(),
        }
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model {
            message: msg.into(),
        }
    }

    pub fn scoring(msg: impl Into<String>) -> Self {
        Self::Scoring {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
