//! # Error Types
//!
//! This module defines error types used throughout the qrforge library.
//!
//! Each variant is one error class. Encode, decode and export failures carry a
//! single generic message per operation; the underlying cause is logged where
//! it happens and never exposed as a partial result.

use thiserror::Error;

/// Main error type for qrforge operations
#[derive(Debug, Error)]
pub enum QrForgeError {
    /// Missing or invalid user input, raised before any encode attempt
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rendering a payload into an image failed
    #[error("{0}")]
    Encode(String),

    /// Recovering a payload from an image failed
    #[error("{0}")]
    Decode(String),

    /// Converting or saving an artifact failed
    #[error("{0}")]
    Export(String),

    /// Persisting history or templates failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A host capability (camera, share target, clipboard) is unavailable
    #[error("{0}")]
    Capability(String),

    /// No history entry or template with the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QrForgeError {
    /// Shorthand for a validation error naming a missing field.
    pub fn missing(field: &str) -> Self {
        QrForgeError::Validation(format!("{} is required", field))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, QrForgeError>;
