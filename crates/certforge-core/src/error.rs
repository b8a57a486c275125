//! Error types module
//!
//! `CertificateError` covers every failure a generation stage can surface.
//! Apart from link shortening, which degrades instead of failing, all of
//! them are fatal to the pipeline call that hit them.

use std::io;
use std::path::PathBuf;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like bad input records
    Debug,
    /// Warning level - for misconfiguration the operator can fix
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for logging and callers.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether running the same call again could succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unreadable asset {}: {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid asset {}: {message}", path.display())]
    InvalidAsset { path: PathBuf, message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Image derivation error: {0}")]
    ImageDerivation(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CertificateError {
    pub fn asset(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CertificateError::Asset {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_asset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CertificateError::InvalidAsset {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CertificateError {
    fn from(err: serde_json::Error) -> Self {
        CertificateError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl ErrorMetadata for CertificateError {
    fn error_code(&self) -> &'static str {
        match self {
            CertificateError::MissingField(_) => "MISSING_FIELD",
            CertificateError::InvalidInput(_) => "INVALID_INPUT",
            CertificateError::Asset { .. } => "ASSET_UNREADABLE",
            CertificateError::InvalidAsset { .. } => "ASSET_INVALID",
            CertificateError::Render(_) => "RENDER_FAILED",
            CertificateError::ImageDerivation(_) => "IMAGE_DERIVATION_FAILED",
            CertificateError::Publish(_) => "UPLOAD_FAILED",
            CertificateError::Notification(_) => "NOTIFICATION_FAILED",
            CertificateError::Io(_) => "IO_ERROR",
            CertificateError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CertificateError::Publish(_)
                | CertificateError::Notification(_)
                | CertificateError::Io(_)
                | CertificateError::Internal(_)
        )
    }

    fn log_level(&self) -> LogLevel {
        match self {
            CertificateError::MissingField(_) | CertificateError::InvalidInput(_) => {
                LogLevel::Debug
            }
            CertificateError::Asset { .. } | CertificateError::InvalidAsset { .. } => {
                LogLevel::Warn
            }
            _ => LogLevel::Error,
        }
    }
}

pub type CertificateResult<T> = Result<T, CertificateError>;
