//! Error types for replication planning.

use lineage_core::replication::ReplicationConfigError;
use thiserror::Error;

/// Result type for replication planning.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors that can occur while planning bucket replication.
///
/// All of them are configuration errors: planning is a one-shot compile step
/// and nothing here is retried.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// The requested or merged configuration is invalid.
    #[error("invalid replication configuration for bucket {bucket}: {source}")]
    Configuration {
        /// Source bucket the configuration belongs to.
        bucket: String,
        /// The validation failure.
        #[source]
        source: ReplicationConfigError,
    },

    /// A rule names a source bucket the plan does not declare.
    #[error("rule {rule_id} references undeclared bucket {bucket}")]
    UnknownBucket {
        /// The offending rule.
        rule_id: String,
        /// The bucket name it references.
        bucket: String,
    },

    /// A plan or existing-configuration document could not be loaded.
    #[error(transparent)]
    Document(#[from] lineage_core::Error),

    /// The configuration could not be rendered as XML.
    #[error("failed to render replication configuration: {0}")]
    Render(String),
}

impl ReplicationError {
    /// Wraps a validation failure with the bucket it applies to.
    #[must_use]
    pub fn configuration(bucket: impl Into<String>, source: ReplicationConfigError) -> Self {
        Self::Configuration { bucket: bucket.into(), source }
    }

    /// Returns the validation failure, if this is a configuration error.
    #[must_use]
    pub fn config_error(&self) -> Option<&ReplicationConfigError> {
        match self {
            Self::Configuration { source, .. } => Some(source),
            _ => None,
        }
    }
}
