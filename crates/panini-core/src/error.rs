//! Error types for Panini

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("missing file: {0}")]
    MissingFile(PathBuf),

    #[error("subprocess failed: {command} - {message}")]
    Subprocess { command: String, message: String },

    #[error("unknown collector: {0}")]
    UnknownCollector(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn subprocess(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subprocess {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Parse and missing-file errors are recovered by skipping the source;
    /// everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::MissingFile(_))
    }
}
