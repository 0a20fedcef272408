//! Error types for the reputation SDK

use reputation_zk_core::VerifyError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or converting artifacts
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid field element {value:?}: {reason}")]
    InvalidFieldElement { value: String, reason: &'static str },

    #[error("Invalid {what} size: expected {expected}, got {actual}")]
    InvalidSize {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported artifact: {0}")]
    Unsupported(String),

    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),
}

pub type Result<T> = std::result::Result<T, SdkError>;
