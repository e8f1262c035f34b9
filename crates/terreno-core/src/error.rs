//! Error types for the Terreno visit core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the visit-session subsystem.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum TerrenoError {
    /// A visit is already in progress; the caller must complete or clear it
    /// before starting a new one.
    #[error("A visit session is already in progress")]
    SessionAlreadyActive,

    /// The requested operation needs an in-progress visit and none exists.
    #[error("No active visit session")]
    NoActiveSession,

    /// Durable store access error (read/write/remove).
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Backend rejected or failed a submission.
    #[error("Submission error: {0}")]
    Submission(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TerrenoError {
    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a Serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a Submission error.
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission(message.into())
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a precondition violation (programmer error, never
    /// retried automatically).
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::SessionAlreadyActive | Self::NoActiveSession)
    }

    /// Check if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

impl From<std::io::Error> for TerrenoError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TerrenoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for TerrenoError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, TerrenoError>`.
pub type Result<T> = std::result::Result<T, TerrenoError>;
