//! Error types for trace-record redaction.
//!
//! Errors are scoped to what they abort: a [`RecordError`] skips one line, a
//! [`RedactorError`] skips one object. Neither stops the rest of the event.

use thiserror::Error;

/// Result type for object-level redaction.
pub type Result<T> = std::result::Result<T, RedactorError>;

/// Object store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },

    /// A request to the store failed.
    #[error("{operation} s3://{bucket}/{key} failed: {message}")]
    Request {
        /// The operation that failed (e.g. `GetObject`).
        operation: &'static str,
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Error reported by the store.
        message: String,
    },
}

impl StoreError {
    /// Creates a request failure.
    pub fn request(
        operation: &'static str,
        bucket: &str,
        key: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::Request {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Why a parsed record could not be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The record was handled by an agent but carries no `ContactId`, so the
    /// redacted file name cannot be built.
    #[error("agent-handled record has no ContactId")]
    MissingContactId,
}

/// A single line of a batch could not be processed. The line is skipped.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The line is not a JSON trace record.
    #[error("line {line}: malformed trace record: {source}")]
    Malformed {
        /// Zero-based line index within the object.
        line: usize,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The record could not be fully rewritten.
    #[error("line {line}: {source}")]
    Rewrite {
        /// Zero-based line index within the object.
        line: usize,
        /// Rewrite failure.
        #[source]
        source: RewriteError,
    },

    /// The rewritten record could not be serialized.
    #[error("line {line}: failed to serialize trace record: {source}")]
    Serialize {
        /// Zero-based line index within the object.
        line: usize,
        /// Serialization failure.
        #[source]
        source: serde_json::Error,
    },
}

impl RecordError {
    /// Returns the zero-based index of the failing line.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Malformed { line, .. }
            | Self::Rewrite { line, .. }
            | Self::Serialize { line, .. } => *line,
        }
    }
}

/// An object could not be processed. The object is skipped.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// Fetching or writing the object failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The object body is not UTF-8 text.
    #[error("s3://{bucket}/{key} is not UTF-8 text: {source}")]
    NotUtf8 {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Decoding failure.
        #[source]
        source: std::str::Utf8Error,
    },

    /// The key has no segment to remove, so the output would overwrite the input.
    #[error("key {key} has no '{segment}' segment")]
    NoOriginalSegment {
        /// Object key.
        key: String,
        /// The segment that was looked for.
        segment: String,
    },

    /// The trigger event could not be parsed.
    #[error("invalid S3 event: {0}")]
    Event(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::request("GetObject", "b", "original/x.json", "access denied");
        assert_eq!(err.to_string(), "GetObject s3://b/original/x.json failed: access denied");

        let err = RedactorError::from(err);
        assert!(err.to_string().starts_with("GetObject"));

        let err = RedactorError::NoOriginalSegment {
            key: "ctr/x.json".to_string(),
            segment: "original".to_string(),
        };
        assert_eq!(err.to_string(), "key ctr/x.json has no 'original' segment");
    }

    #[test]
    fn test_record_error_line() {
        let err = RecordError::Rewrite { line: 4, source: RewriteError::MissingContactId };
        assert_eq!(err.line(), 4);
        assert_eq!(err.to_string(), "line 4: agent-handled record has no ContactId");
    }
}
