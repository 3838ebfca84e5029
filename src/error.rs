//! @acp:module "Errors"
//! @acp:summary "Error types for resolution and configuration loading"
//! @acp:domain cli
//! @acp:layer utility
//!
//! Only usage-level failures surface as errors. Unreadable sources during
//! resolution degrade to defaults and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

/// @acp:summary "Library error type"
#[derive(Debug, Error)]
pub enum MapError {
    /// I/O error outside of best-effort source reads
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Target directory does not exist or is not a directory
    #[error("{} does not exist or is not a directory", .0.display())]
    InvalidTarget(PathBuf),

    /// Settings file could not be used
    #[error("Invalid settings in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, MapError>;
