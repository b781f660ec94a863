//! Replication plans.
//!
//! A plan file declares source buckets and the rules to add to them:
//!
//! ```toml
//! [[bucket]]
//! name = "acme-dev-storage"
//! account = "111111111111"
//!
//! [[rule]]
//! rule_id = "data-analytics-connect-data-replication-rule-dev"
//! source_bucket = "acme-dev-storage"
//! filter_prefix = "Analysis/Voice/Redacted/"
//! source_key_arn = "arn:aws:kms:us-east-1:111111111111:key/source"
//! destination_account = "222222222222"
//! destination_bucket = "analytics-landing"
//! destination_key_arn = "arn:aws:kms:us-east-1:222222222222:key/dest"
//! ```
//!
//! Compiling a plan against the buckets' current replication configurations
//! yields the desired state of every bucket that received a rule.

use std::collections::BTreeMap;
use std::path::Path;

use lineage_core::replication::{ReplicationConfiguration, VersioningStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::bucket::SourceBucket;
use crate::error::{ReplicationError, Result};
use crate::manager::{PlanOutput, ReplicationRuleManager};
use crate::role::ReplicationRole;
use crate::rule::RuleRequest;
use crate::xml::replication_configuration_xml;

/// Declared buckets and rule requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFile {
    /// Source buckets.
    #[serde(default, rename = "bucket")]
    pub buckets: Vec<SourceBucket>,
    /// Rules to add, in order.
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleRequest>,
}

impl PlanFile {
    /// Load a plan from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(lineage_core::Error::from)?;
        Self::parse(&content)
    }

    /// Parse a plan from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| lineage_core::Error::config(format!("invalid plan: {e}")).into())
    }
}

/// Parse current replication configurations keyed by bucket name.
///
/// Each value is either the bare `{Role, Rules}` document or the envelope
/// printed by `aws s3api get-bucket-replication`.
///
/// # Errors
///
/// Returns an error if the JSON is not an object of replication configurations.
pub fn parse_existing(json: &str) -> Result<BTreeMap<String, ReplicationConfiguration>> {
    let value: Value = serde_json::from_str(json).map_err(lineage_core::Error::from)?;
    let Value::Object(buckets) = value else {
        return Err(lineage_core::Error::InvalidRequest(
            "existing configurations must be an object keyed by bucket name".to_string(),
        )
        .into());
    };

    buckets
        .into_iter()
        .map(|(bucket, config)| -> Result<_> {
            Ok((bucket, ReplicationConfiguration::from_value(config)?))
        })
        .collect()
}

/// Desired state of one source bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPlan {
    /// Bucket name.
    pub bucket: String,
    /// Versioning status to apply.
    pub versioning: VersioningStatus,
    /// Complete replication configuration to apply.
    pub replication_configuration: ReplicationConfiguration,
    /// Replication role with its trust and managed policies.
    pub role: ReplicationRole,
    /// Exported values.
    pub outputs: Vec<PlanOutput>,
}

/// Desired state of every bucket a plan touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationPlan {
    /// Per-bucket desired state, in declaration order.
    pub buckets: Vec<BucketPlan>,
}

impl ReplicationPlan {
    /// Renders the plan as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| lineage_core::Error::from(e).into())
    }

    /// Renders each bucket's replication configuration as an S3 XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_xml_documents(&self) -> Result<Vec<(String, String)>> {
        self.buckets
            .iter()
            .map(|b| -> Result<_> {
                Ok((b.bucket.clone(), replication_configuration_xml(&b.replication_configuration)?))
            })
            .collect()
    }
}

/// Compiles a plan against the buckets' current replication configurations.
///
/// A configuration in `existing` is used for a declared bucket that does not
/// carry one itself. Rules are added in file order.
///
/// # Errors
///
/// Returns the first configuration error; nothing is produced on error.
pub fn compile(
    plan: PlanFile,
    existing: &BTreeMap<String, ReplicationConfiguration>,
) -> Result<ReplicationPlan> {
    let mut buckets = plan.buckets;
    for bucket in &mut buckets {
        if bucket.replication.is_none() {
            bucket.replication = existing.get(&bucket.name).cloned();
        }
    }
    for name in existing.keys() {
        if !buckets.iter().any(|b| &b.name == name) {
            warn!(bucket = %name, "Ignoring existing configuration for undeclared bucket");
        }
    }

    let mut manager = ReplicationRuleManager::new();
    for request in &plan.rules {
        let bucket =
            buckets.iter_mut().find(|b| b.name == request.source_bucket).ok_or_else(|| {
                ReplicationError::UnknownBucket {
                    rule_id: request.rule_id.clone(),
                    bucket: request.source_bucket.clone(),
                }
            })?;
        manager.add_replication_rule(bucket, request)?;
    }

    let mut planned = Vec::new();
    for bucket in buckets {
        let (Some(role), Some(config)) = (manager.role(&bucket.name), bucket.replication) else {
            warn!(bucket = %bucket.name, "No replication rules for bucket");
            continue;
        };
        planned.push(BucketPlan {
            outputs: manager.output(&bucket.name).cloned().into_iter().collect(),
            bucket: bucket.name,
            versioning: bucket.versioning,
            replication_configuration: config,
            role: role.clone(),
        });
    }

    info!(buckets = planned.len(), rules = plan.rules.len(), "Compiled replication plan");
    Ok(ReplicationPlan { buckets: planned })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
[[bucket]]
name = "acme-dev-storage"
account = "111111111111"

[[bucket]]
name = "acme-dev-unused"
account = "111111111111"

[[rule]]
rule_id = "connect-data"
source_bucket = "acme-dev-storage"
filter_prefix = "Analysis/Voice/Redacted/"
source_key_arn = "arn:aws:kms:us-east-1:111111111111:key/source"
destination_account = "222222222222"
destination_bucket = "analytics-landing"
destination_key_arn = "arn:aws:kms:us-east-1:222222222222:key/dest"
"#;

    #[test]
    fn test_parse_plan() {
        let plan = PlanFile::parse(PLAN).unwrap();
        assert_eq!(plan.buckets.len(), 2);
        assert_eq!(plan.buckets[0].versioning, VersioningStatus::Unversioned);
        assert_eq!(plan.rules.len(), 1);
        assert_eq!(plan.rules[0].filter_prefix.as_deref(), Some("Analysis/Voice/Redacted/"));
    }

    #[test]
    fn test_parse_invalid_plan() {
        let err = PlanFile::parse("[[rule]]\nrule_id = 3").unwrap_err();
        assert!(matches!(err, ReplicationError::Document(lineage_core::Error::Config(_))));
    }

    #[test]
    fn test_plan_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(&path, PLAN).unwrap();
        assert_eq!(PlanFile::from_file(&path).unwrap(), PlanFile::parse(PLAN).unwrap());
    }

    #[test]
    fn test_compile_skips_buckets_without_rules() {
        let plan = compile(PlanFile::parse(PLAN).unwrap(), &BTreeMap::new()).unwrap();
        assert_eq!(plan.buckets.len(), 1);

        let bucket = &plan.buckets[0];
        assert_eq!(bucket.bucket, "acme-dev-storage");
        assert_eq!(bucket.versioning, VersioningStatus::Enabled);
        assert_eq!(bucket.replication_configuration.rules.len(), 1);
        assert_eq!(bucket.role.managed_policies.len(), 1);
        assert_eq!(bucket.outputs[0].description, "Replication Role for: acme-dev-storage");
    }

    #[test]
    fn test_compile_rejects_undeclared_bucket() {
        let mut plan = PlanFile::parse(PLAN).unwrap();
        plan.rules[0].source_bucket = "missing".to_string();
        let err = compile(plan, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ReplicationError::UnknownBucket { ref bucket, .. } if bucket == "missing"));
    }

    #[test]
    fn test_parse_existing() {
        let json = r#"{
            "acme-dev-storage": {
                "ReplicationConfiguration": {
                    "Role": "arn:aws:iam::111111111111:role/old",
                    "Rules": [{ "ID": "old", "Status": "Enabled", "Priority": 3,
                                "Destination": { "Bucket": "arn:aws:s3:::old" } }]
                }
            }
        }"#;
        let existing = parse_existing(json).unwrap();
        assert_eq!(existing["acme-dev-storage"].max_priority(), 3);

        assert!(parse_existing("[]").is_err());
    }

    #[test]
    fn test_plan_renders_json_and_xml() {
        let plan = compile(PlanFile::parse(PLAN).unwrap(), &BTreeMap::new()).unwrap();

        let json: Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        let bucket = &json["Buckets"][0];
        assert_eq!(bucket["Versioning"], "Enabled");
        assert_eq!(bucket["ReplicationConfiguration"]["Rules"][0]["ID"], "connect-data");
        assert_eq!(bucket["Role"]["RoleName"], "acme-dev-storage-replication-role");

        let xml = plan.to_xml_documents().unwrap();
        assert_eq!(xml.len(), 1);
        assert_eq!(xml[0].0, "acme-dev-storage");
        assert!(xml[0].1.contains("<ID>connect-data</ID>"));
    }
}
