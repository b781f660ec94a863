// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! S3 REST XML rendering of replication configurations.
//!
//! Produces the body of `PUT /{bucket}?replication`. Unlike the JSON shape,
//! rules repeat as `<Rule>` elements and field order follows the S3 schema.

use lineage_core::replication::{ReplicationConfiguration, ReplicationRule};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ReplicationError, Result};

/// S3 XML namespace.
pub const S3_XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// `ReplicationConfiguration` document.
#[derive(Debug, Serialize)]
#[serde(rename = "ReplicationConfiguration")]
pub struct ReplicationConfigurationXml {
    /// XML namespace.
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    /// IAM role ARN.
    #[serde(rename = "Role")]
    pub role: String,
    /// Replication rules.
    #[serde(rename = "Rule")]
    pub rules: Vec<RuleXml>,
}

/// Replication rule element.
#[derive(Debug, Serialize)]
pub struct RuleXml {
    /// Rule ID.
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Rule priority.
    #[serde(rename = "Priority", skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    /// Legacy rule-level key prefix, superseded by `Filter`.
    #[serde(rename = "Prefix", skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Object filter.
    #[serde(rename = "Filter", skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterXml>,
    /// Rule status.
    #[serde(rename = "Status")]
    pub status: String,
    /// Source selection criteria.
    #[serde(rename = "SourceSelectionCriteria", skip_serializing_if = "Option::is_none")]
    pub source_selection_criteria: Option<SourceSelectionCriteriaXml>,
    /// Existing object replication.
    #[serde(rename = "ExistingObjectReplication", skip_serializing_if = "Option::is_none")]
    pub existing_object_replication: Option<StatusXml>,
    /// Destination.
    #[serde(rename = "Destination")]
    pub destination: DestinationXml,
    /// Delete marker replication.
    #[serde(rename = "DeleteMarkerReplication", skip_serializing_if = "Option::is_none")]
    pub delete_marker_replication: Option<StatusXml>,
}

/// Filter element.
#[derive(Debug, Serialize)]
pub struct FilterXml {
    /// Key prefix.
    #[serde(rename = "Prefix", skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Single tag.
    #[serde(rename = "Tag", skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagXml>,
    /// Conjunction of conditions.
    #[serde(rename = "And", skip_serializing_if = "Option::is_none")]
    pub and: Option<FilterAndXml>,
}

/// `And` filter element.
#[derive(Debug, Serialize)]
pub struct FilterAndXml {
    /// Key prefix.
    #[serde(rename = "Prefix", skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Tags.
    #[serde(rename = "Tag")]
    pub tags: Vec<TagXml>,
}

/// Tag element.
#[derive(Debug, Serialize)]
pub struct TagXml {
    /// Tag key.
    #[serde(rename = "Key")]
    pub key: String,
    /// Tag value.
    #[serde(rename = "Value")]
    pub value: String,
}

/// Destination element.
#[derive(Debug, Serialize)]
pub struct DestinationXml {
    /// Destination bucket ARN.
    #[serde(rename = "Bucket")]
    pub bucket: String,
    /// Destination account.
    #[serde(rename = "Account", skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Storage class.
    #[serde(rename = "StorageClass", skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    /// Owner override.
    #[serde(rename = "AccessControlTranslation", skip_serializing_if = "Option::is_none")]
    pub access_control_translation: Option<OwnerXml>,
    /// Replica encryption.
    #[serde(rename = "EncryptionConfiguration", skip_serializing_if = "Option::is_none")]
    pub encryption_configuration: Option<EncryptionXml>,
    /// Replication time control.
    #[serde(rename = "ReplicationTime", skip_serializing_if = "Option::is_none")]
    pub replication_time: Option<TimedStatusXml>,
    /// Replication metrics.
    #[serde(rename = "Metrics", skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsXml>,
}

/// `AccessControlTranslation` element.
#[derive(Debug, Serialize)]
pub struct OwnerXml {
    /// Owner override.
    #[serde(rename = "Owner")]
    pub owner: String,
}

/// `EncryptionConfiguration` element.
#[derive(Debug, Serialize)]
pub struct EncryptionXml {
    /// Replica KMS key.
    #[serde(rename = "ReplicaKmsKeyID", skip_serializing_if = "Option::is_none")]
    pub replica_kms_key_id: Option<String>,
}

/// `SourceSelectionCriteria` element.
#[derive(Debug, Serialize)]
pub struct SourceSelectionCriteriaXml {
    /// SSE-KMS object selection.
    #[serde(rename = "SseKmsEncryptedObjects", skip_serializing_if = "Option::is_none")]
    pub sse_kms_encrypted_objects: Option<StatusXml>,
    /// Replica modification sync.
    #[serde(rename = "ReplicaModifications", skip_serializing_if = "Option::is_none")]
    pub replica_modifications: Option<StatusXml>,
}

/// Element holding only a status.
#[derive(Debug, Serialize)]
pub struct StatusXml {
    /// `Enabled` or `Disabled`.
    #[serde(rename = "Status")]
    pub status: String,
}

/// `ReplicationTime` element.
#[derive(Debug, Serialize)]
pub struct TimedStatusXml {
    /// Status.
    #[serde(rename = "Status")]
    pub status: String,
    /// Threshold.
    #[serde(rename = "Time", skip_serializing_if = "Option::is_none")]
    pub time: Option<MinutesXml>,
}

/// `Metrics` element.
#[derive(Debug, Serialize)]
pub struct MetricsXml {
    /// Status.
    #[serde(rename = "Status")]
    pub status: String,
    /// Event threshold.
    #[serde(rename = "EventThreshold", skip_serializing_if = "Option::is_none")]
    pub event_threshold: Option<MinutesXml>,
}

/// Time value element.
#[derive(Debug, Serialize)]
pub struct MinutesXml {
    /// Minutes.
    #[serde(rename = "Minutes")]
    pub minutes: u32,
}

fn status(s: lineage_core::replication::RuleStatus) -> String {
    s.as_str().to_string()
}

/// Reads the legacy top-level `Prefix` of an ingested rule.
///
/// Any other field the model does not name cannot be expressed in XML and is
/// rejected rather than dropped.
fn legacy_prefix(rule: &ReplicationRule) -> Result<Option<String>> {
    let mut prefix = None;
    for (name, value) in &rule.extra {
        match (name.as_str(), value) {
            ("Prefix", Value::String(p)) => prefix = Some(p.clone()),
            ("Prefix", Value::Null) => {}
            _ => {
                return Err(ReplicationError::Render(format!(
                    "rule {} has field {name} with no XML form",
                    rule.id.as_deref().unwrap_or_default()
                )))
            }
        }
    }
    Ok(prefix)
}

impl TryFrom<&ReplicationConfiguration> for ReplicationConfigurationXml {
    type Error = ReplicationError;

    fn try_from(config: &ReplicationConfiguration) -> Result<Self> {
        let rules = config
            .rules
            .iter()
            .map(|r| -> Result<RuleXml> {
                Ok(RuleXml {
                    id: r.id.clone(),
                    priority: r.priority,
                    prefix: legacy_prefix(r)?,
                    filter: r.filter.as_ref().map(|f| FilterXml {
                        prefix: f.prefix.clone(),
                        tag: f
                            .tag
                            .as_ref()
                            .map(|t| TagXml { key: t.key.clone(), value: t.value.clone() }),
                        and: f.and.as_ref().map(|a| FilterAndXml {
                            prefix: a.prefix.clone(),
                            tags: a
                                .tags
                                .iter()
                                .map(|t| TagXml { key: t.key.clone(), value: t.value.clone() })
                                .collect(),
                        }),
                    }),
                    status: status(r.status),
                    source_selection_criteria: r.source_selection_criteria.as_ref().map(|s| {
                        SourceSelectionCriteriaXml {
                            sse_kms_encrypted_objects: s
                                .sse_kms_encrypted_objects
                                .as_ref()
                                .map(|x| StatusXml { status: status(x.status) }),
                            replica_modifications: s
                                .replica_modifications
                                .as_ref()
                                .map(|x| StatusXml { status: status(x.status) }),
                        }
                    }),
                    existing_object_replication: r
                        .existing_object_replication
                        .as_ref()
                        .map(|e| StatusXml { status: status(e.status) }),
                    destination: DestinationXml {
                        bucket: r.destination.bucket.clone(),
                        account: r.destination.account.clone(),
                        storage_class: r.destination.storage_class.clone(),
                        access_control_translation: r
                            .destination
                            .access_control_translation
                            .as_ref()
                            .map(|a| OwnerXml { owner: a.owner.clone() }),
                        encryption_configuration: r
                            .destination
                            .encryption_configuration
                            .as_ref()
                            .map(|e| EncryptionXml { replica_kms_key_id: e.replica_kms_key_id.clone() }),
                        replication_time: r.destination.replication_time.as_ref().map(|rt| {
                            TimedStatusXml {
                                status: status(rt.status),
                                time: rt.time.as_ref().map(|t| MinutesXml { minutes: t.minutes }),
                            }
                        }),
                        metrics: r.destination.metrics.as_ref().map(|m| MetricsXml {
                            status: status(m.status),
                            event_threshold: m
                                .event_threshold
                                .as_ref()
                                .map(|t| MinutesXml { minutes: t.minutes }),
                        }),
                    },
                    delete_marker_replication: r
                        .delete_marker_replication
                        .as_ref()
                        .map(|d| StatusXml { status: status(d.status) }),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { xmlns: S3_XMLNS, role: config.role.clone(), rules })
    }
}

/// Serialize a value to an XML document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    quick_xml::se::to_writer(&mut buffer, value)
        .map_err(|e| ReplicationError::Render(e.to_string()))?;
    Ok(buffer)
}

/// Renders a replication configuration as the S3 REST XML body.
///
/// # Errors
///
/// Returns an error if a rule carries fields with no XML form, or if
/// serialization fails.
pub fn replication_configuration_xml(config: &ReplicationConfiguration) -> Result<String> {
    to_xml(&ReplicationConfigurationXml::try_from(config)?)
}
