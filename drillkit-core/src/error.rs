//! Error taxonomy shared by every workflow and backend adapter.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrillError>;

#[derive(Error, Debug)]
pub enum DrillError {
    /// Missing or invalid settings. Raised before any side effect.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The thumbnail converter is missing or exited non-zero.
    #[error("Failed to render thumbnail for {}: {output}", .path.display())]
    Render { path: PathBuf, output: String },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Backend error: {0}")]
    Backend(String),

    /// A stored public URL could not be turned back into a storage key.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DrillError {
    pub fn backend(context: &str, err: impl std::fmt::Display) -> Self {
        DrillError::Backend(format!("{context}: {err}"))
    }

    pub fn upload(context: &str, err: impl std::fmt::Display) -> Self {
        DrillError::Upload(format!("{context}: {err}"))
    }
}
