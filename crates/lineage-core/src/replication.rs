// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! S3 bucket replication configuration types.
//!
//! The serde representation matches the JSON accepted and returned by
//! `aws s3api put-bucket-replication` / `get-bucket-replication`:
//!
//! ```json
//! {
//!   "Role": "arn:aws:iam::111111111111:role/acme-dev-storage-replication-role",
//!   "Rules": [{
//!     "ID": "data-replication-rule-dev",
//!     "Status": "Enabled",
//!     "Priority": 1,
//!     "Filter": { "Prefix": "Analysis/Voice/Redacted/" },
//!     "Destination": {
//!       "Bucket": "arn:aws:s3:::analytics-landing",
//!       "Account": "222222222222",
//!       "AccessControlTranslation": { "Owner": "Destination" },
//!       "EncryptionConfiguration": { "ReplicaKmsKeyID": "arn:aws:kms:..." }
//!     },
//!     "DeleteMarkerReplication": { "Status": "Enabled" },
//!     "SourceSelectionCriteria": { "SseKmsEncryptedObjects": { "Status": "Enabled" } }
//!   }]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Replication configuration for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationConfiguration {
    /// IAM role ARN for replication.
    pub role: String,
    /// List of replication rules.
    pub rules: Vec<ReplicationRule>,
}

impl ReplicationConfiguration {
    /// Parse a configuration from JSON.
    ///
    /// Accepts both the bare document and the `{"ReplicationConfiguration": {...}}`
    /// envelope printed by `aws s3api get-bucket-replication`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a replication configuration.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parse a configuration from an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not describe a replication configuration.
    pub fn from_value(mut value: Value) -> crate::Result<Self> {
        if let Some(inner) = value.get_mut("ReplicationConfiguration") {
            value = inner.take();
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        if self.role.is_empty() {
            return Err(ReplicationConfigError::MissingRole);
        }

        if self.rules.is_empty() {
            return Err(ReplicationConfigError::NoRules);
        }

        let mut ids = HashSet::new();
        let mut priorities = HashSet::new();
        for rule in &self.rules {
            if let Some(ref id) = rule.id {
                if !ids.insert(id.as_str()) {
                    return Err(ReplicationConfigError::DuplicateRuleId(id.clone()));
                }
            }
            if let Some(priority) = rule.priority {
                if !priorities.insert(priority) {
                    return Err(ReplicationConfigError::DuplicatePriority(priority));
                }
            }
        }

        for rule in &self.rules {
            rule.validate()?;
        }

        Ok(())
    }

    /// Highest priority among the rules, or 0 when none carries a priority.
    #[must_use]
    pub fn max_priority(&self) -> u32 {
        self.rules.iter().filter_map(|r| r.priority).max().unwrap_or(0)
    }

    /// Look up a rule by ID.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&ReplicationRule> {
        self.rules.iter().find(|r| r.id.as_deref() == Some(id))
    }

    /// Get all enabled rules.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &ReplicationRule> {
        self.rules.iter().filter(|r| r.status == RuleStatus::Enabled)
    }
}

/// A single replication rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationRule {
    /// Unique identifier for the rule.
    #[serde(default, rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Status of the rule (Enabled or Disabled).
    pub status: RuleStatus,

    /// Priority of the rule. Unique per bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    /// Filter to select objects this rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ReplicationFilter>,

    /// Destination bucket for replicated objects.
    pub destination: ReplicationDestination,

    /// Whether to replicate delete markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_marker_replication: Option<DeleteMarkerReplication>,

    /// Criteria for selecting source objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_selection_criteria: Option<SourceSelectionCriteria>,

    /// Whether to replicate existing objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_object_replication: Option<ExistingObjectReplication>,

    /// Fields of an existing rule this model does not name, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReplicationRule {
    /// Validate the rule.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        if self.destination.bucket.is_empty() {
            return Err(ReplicationConfigError::MissingDestination);
        }

        // S3 rejects a replica key unless SSE-KMS objects are selected.
        let encrypts = self
            .destination
            .encryption_configuration
            .as_ref()
            .and_then(|e| e.replica_kms_key_id.as_ref())
            .is_some();
        if encrypts && !self.replicates_sse_kms_objects() {
            return Err(ReplicationConfigError::MissingSseKmsSelection(
                self.id.clone().unwrap_or_default(),
            ));
        }
        Ok(())
    }

    /// Returns true if SSE-KMS encrypted source objects are selected for replication.
    #[must_use]
    pub fn replicates_sse_kms_objects(&self) -> bool {
        self.source_selection_criteria
            .as_ref()
            .and_then(|c| c.sse_kms_encrypted_objects.as_ref())
            .is_some_and(|s| s.status == RuleStatus::Enabled)
    }
}

/// Status of a replication rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleStatus {
    /// Rule is active.
    #[default]
    Enabled,
    /// Rule is inactive.
    Disabled,
}

impl RuleStatus {
    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Enabled" => Some(Self::Enabled),
            "Disabled" => Some(Self::Disabled),
            _ => None,
        }
    }

    /// Convert to string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }
}

/// Filter to select objects for replication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationFilter {
    /// Key name prefix that selects objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Tag that selects objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<ReplicationTag>,

    /// Logical AND of multiple filter conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<ReplicationFilterAnd>,
}

/// Logical AND filter for replication rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationFilterAnd {
    /// Key name prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Tags to match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ReplicationTag>,
}

/// A tag used in replication filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Destination for replicated objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationDestination {
    /// Destination bucket ARN.
    pub bucket: String,

    /// Account ID for cross-account replication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Storage class for replicated objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Access control translation for cross-account replication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control_translation: Option<AccessControlTranslation>,

    /// Encryption configuration for replicated objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_configuration: Option<EncryptionConfiguration>,

    /// Replication time control settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_time: Option<ReplicationTime>,

    /// Metrics configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ReplicationMetrics>,
}

/// Access control translation for cross-account replication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessControlTranslation {
    /// Owner override. Always `Destination`.
    pub owner: String,
}

impl AccessControlTranslation {
    /// Replicas are owned by the destination bucket owner.
    #[must_use]
    pub fn destination() -> Self {
        Self { owner: "Destination".to_string() }
    }
}

/// Encryption configuration for destination objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfiguration {
    /// KMS key ID for destination encryption.
    #[serde(default, rename = "ReplicaKmsKeyID", skip_serializing_if = "Option::is_none")]
    pub replica_kms_key_id: Option<String>,
}

/// Replication time control settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationTime {
    /// Status of replication time control.
    pub status: RuleStatus,
    /// Time threshold in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<ReplicationTimeValue>,
}

/// Time value for replication time control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationTimeValue {
    /// Minutes threshold.
    pub minutes: u32,
}

/// Metrics configuration for replication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationMetrics {
    /// Status of metrics.
    pub status: RuleStatus,
    /// Event threshold for metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_threshold: Option<ReplicationTimeValue>,
}

/// Delete marker replication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMarkerReplication {
    /// Status of delete marker replication.
    pub status: RuleStatus,
}

/// Source selection criteria for replication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceSelectionCriteria {
    /// Settings for replicating SSE-KMS encrypted objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sse_kms_encrypted_objects: Option<SseKmsEncryptedObjects>,

    /// Replica modifications settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_modifications: Option<ReplicaModifications>,
}

/// Settings for replicating SSE-KMS encrypted objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SseKmsEncryptedObjects {
    /// Status of SSE-KMS replication.
    pub status: RuleStatus,
}

/// Replica modifications settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicaModifications {
    /// Status of replica modifications replication.
    pub status: RuleStatus,
}

/// Existing object replication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExistingObjectReplication {
    /// Status of existing object replication.
    pub status: RuleStatus,
}

/// Bucket versioning status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersioningStatus {
    /// Versioning has never been configured.
    #[default]
    Unversioned,
    /// Versioning is enabled.
    Enabled,
    /// Versioning was enabled and is now suspended.
    Suspended,
}

/// Errors from replication configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationConfigError {
    /// Role ARN is required.
    #[error("Role ARN is required")]
    MissingRole,

    /// At least one rule is required.
    #[error("At least one rule is required")]
    NoRules,

    /// Duplicate rule ID.
    #[error("Duplicate rule ID: {0}")]
    DuplicateRuleId(String),

    /// Duplicate rule priority.
    #[error("Duplicate rule priority: {0}")]
    DuplicatePriority(u32),

    /// Destination bucket is required.
    #[error("Destination bucket is required")]
    MissingDestination,

    /// A required identifier was empty.
    #[error("Missing required identifier: {0}")]
    MissingIdentifier(&'static str),

    /// No priority is left above the highest existing one.
    #[error("No rule priority is available above {0}")]
    PriorityOverflow(u32),

    /// A replica KMS key was set without selecting SSE-KMS encrypted objects.
    #[error("Rule {0} sets a replica KMS key but does not replicate SSE-KMS encrypted objects")]
    MissingSseKmsSelection(String),
}
