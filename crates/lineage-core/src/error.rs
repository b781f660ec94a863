// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Error types for Lineage.

use thiserror::Error;

/// A specialized `Result` type for Lineage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration or documents.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if this error was caused by bad operator input rather than I/O.
    #[must_use]
    pub const fn is_operator_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidRequest(_) | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("prefix must not be empty");
        assert_eq!(err.to_string(), "configuration error: prefix must not be empty");
        assert!(err.is_operator_error());

        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(!err.is_operator_error());
    }
}
