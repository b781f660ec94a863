//! Desired state of a replication source bucket.

use lineage_core::replication::{ReplicationConfiguration, VersioningStatus};
use serde::{Deserialize, Serialize};

/// Returns the ARN of an S3 bucket. ARNs are passed through unchanged.
#[must_use]
pub fn bucket_arn(name_or_arn: &str) -> String {
    if name_or_arn.starts_with("arn:") {
        name_or_arn.to_string()
    } else {
        format!("arn:aws:s3:::{name_or_arn}")
    }
}

/// Returns the ARN matching every object of an S3 bucket.
#[must_use]
pub fn objects_arn(name_or_arn: &str) -> String {
    format!("{}/*", bucket_arn(name_or_arn))
}

/// A bucket that replicates to other accounts.
///
/// Holds the properties replication planning reads and writes; an external
/// provisioning layer applies them to the real resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBucket {
    /// Bucket name.
    pub name: String,
    /// Account that owns the bucket (and its replication role).
    pub account: String,
    /// Versioning status.
    #[serde(default)]
    pub versioning: VersioningStatus,
    /// Current replication configuration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication: Option<ReplicationConfiguration>,
}

impl SourceBucket {
    /// Creates an unversioned bucket with no replication configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account: account.into(),
            versioning: VersioningStatus::Unversioned,
            replication: None,
        }
    }

    /// Sets the current replication configuration.
    #[must_use]
    pub fn with_replication(mut self, replication: ReplicationConfiguration) -> Self {
        self.replication = Some(replication);
        self
    }

    /// Returns the bucket ARN.
    #[must_use]
    pub fn arn(&self) -> String {
        bucket_arn(&self.name)
    }

    /// Returns the ARN matching every object in the bucket.
    #[must_use]
    pub fn objects_arn(&self) -> String {
        objects_arn(&self.name)
    }

    /// Enables versioning. Returns true if the status changed.
    pub fn enable_versioning(&mut self) -> bool {
        let changed = self.versioning != VersioningStatus::Enabled;
        self.versioning = VersioningStatus::Enabled;
        changed
    }
}
