//! Replication rule requests and the configuration merge.
//!
//! [`merge_rule`] is a pure function from the bucket's current configuration
//! to the next one. Reading the current configuration and applying the result
//! happen elsewhere.

use lineage_core::replication::{
    AccessControlTranslation, DeleteMarkerReplication, EncryptionConfiguration,
    ReplicationConfigError, ReplicationConfiguration, ReplicationDestination, ReplicationFilter,
    ReplicationRule, RuleStatus, SourceSelectionCriteria, SseKmsEncryptedObjects,
};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::bucket::bucket_arn;
use crate::role::ReplicationGrant;

/// Prefix used when a rule does not filter: the whole bucket.
pub const DEFAULT_FILTER_PREFIX: &str = "/";

/// A request to replicate (part of) a source bucket to another account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRequest {
    /// Rule ID. Must be unique per bucket; supplying it keeps S3 from
    /// generating random IDs that are hard to tell apart.
    pub rule_id: String,
    /// Source bucket name.
    pub source_bucket: String,
    /// Key prefix to replicate. Defaults to the whole bucket.
    #[serde(default)]
    pub filter_prefix: Option<String>,
    /// KMS key that encrypts source objects.
    pub source_key_arn: String,
    /// Account that owns the destination bucket.
    pub destination_account: String,
    /// Destination bucket name or ARN.
    pub destination_bucket: String,
    /// KMS key replicas are encrypted with.
    pub destination_key_arn: String,
    /// Existing replication role to use instead of the bucket's own.
    #[serde(default)]
    pub role_arn: Option<String>,
}

impl RuleRequest {
    /// Fails fast if a required identifier is empty.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        let required = [
            ("rule id", &self.rule_id),
            ("source bucket", &self.source_bucket),
            ("source key", &self.source_key_arn),
            ("destination account", &self.destination_account),
            ("destination bucket", &self.destination_bucket),
            ("destination key", &self.destination_key_arn),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ReplicationConfigError::MissingIdentifier(name));
            }
        }
        if self.role_arn.as_deref().is_some_and(|arn| arn.trim().is_empty()) {
            return Err(ReplicationConfigError::MissingIdentifier("role arn"));
        }
        Ok(())
    }

    /// Returns the permissions the replication role needs for this rule.
    #[must_use]
    pub fn grant(&self) -> ReplicationGrant {
        ReplicationGrant {
            source_bucket: self.source_bucket.clone(),
            destination_bucket: self.destination_bucket.clone(),
            source_key_arn: self.source_key_arn.clone(),
            destination_key_arn: self.destination_key_arn.clone(),
        }
    }

    /// Builds the replication rule for this request at the given priority.
    #[must_use]
    pub fn to_rule(&self, priority: u32) -> ReplicationRule {
        ReplicationRule {
            id: Some(self.rule_id.clone()),
            status: RuleStatus::Enabled,
            priority: Some(priority),
            filter: Some(ReplicationFilter {
                prefix: Some(
                    self.filter_prefix
                        .clone()
                        .filter(|p| !p.is_empty())
                        .unwrap_or_else(|| DEFAULT_FILTER_PREFIX.to_string()),
                ),
                tag: None,
                and: None,
            }),
            destination: ReplicationDestination {
                bucket: bucket_arn(&self.destination_bucket),
                account: Some(self.destination_account.clone()),
                storage_class: None,
                access_control_translation: Some(AccessControlTranslation::destination()),
                encryption_configuration: Some(EncryptionConfiguration {
                    replica_kms_key_id: Some(self.destination_key_arn.clone()),
                }),
                replication_time: None,
                metrics: None,
            },
            delete_marker_replication: Some(DeleteMarkerReplication { status: RuleStatus::Enabled }),
            source_selection_criteria: Some(SourceSelectionCriteria {
                sse_kms_encrypted_objects: Some(SseKmsEncryptedObjects {
                    status: RuleStatus::Enabled,
                }),
                replica_modifications: None,
            }),
            existing_object_replication: None,
            extra: Map::new(),
        }
    }
}

/// Priority for a rule appended after `existing`: one above the highest, or 1.
///
/// # Errors
///
/// Returns `PriorityOverflow` if an existing rule already holds `u32::MAX`.
pub fn next_priority(
    existing: Option<&ReplicationConfiguration>,
) -> Result<u32, ReplicationConfigError> {
    let max = existing.map_or(0, ReplicationConfiguration::max_priority);
    max.checked_add(1).ok_or(ReplicationConfigError::PriorityOverflow(max))
}

/// Appends `rule` to the bucket's current configuration.
///
/// Existing rules are kept unchanged and in order; only the role is replaced
/// with `role_arn`, since every rule on a bucket shares one role. The result
/// is validated as a whole.
pub fn merge_rule(
    existing: Option<&ReplicationConfiguration>,
    role_arn: &str,
    rule: ReplicationRule,
) -> Result<ReplicationConfiguration, ReplicationConfigError> {
    let mut rules = existing.map(|c| c.rules.clone()).unwrap_or_default();

    if let Some(id) = rule.id.as_deref() {
        if rules.iter().any(|r| r.id.as_deref() == Some(id)) {
            return Err(ReplicationConfigError::DuplicateRuleId(id.to_string()));
        }
    }
    rules.push(rule);

    let merged = ReplicationConfiguration { role: role_arn.to_string(), rules };
    merged.validate()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rule_id: &str) -> RuleRequest {
        RuleRequest {
            rule_id: rule_id.to_string(),
            source_bucket: "acme-dev-storage".to_string(),
            filter_prefix: None,
            source_key_arn: "arn:aws:kms:us-east-1:111111111111:key/source".to_string(),
            destination_account: "222222222222".to_string(),
            destination_bucket: "analytics-landing".to_string(),
            destination_key_arn: "arn:aws:kms:us-east-1:222222222222:key/dest".to_string(),
            role_arn: None,
        }
    }

    const ROLE: &str = "arn:aws:iam::111111111111:role/acme-dev-storage-replication-role";

    #[test]
    fn test_request_validation() {
        assert!(request("r1").validate().is_ok());

        let mut r = request("r1");
        r.destination_account = String::new();
        assert_eq!(
            r.validate(),
            Err(ReplicationConfigError::MissingIdentifier("destination account"))
        );

        let mut r = request("");
        r.destination_key_arn = String::new();
        assert_eq!(r.validate(), Err(ReplicationConfigError::MissingIdentifier("rule id")));

        let mut r = request("r1");
        r.role_arn = Some(" ".to_string());
        assert_eq!(r.validate(), Err(ReplicationConfigError::MissingIdentifier("role arn")));
    }

    #[test]
    fn test_rule_shape() {
        let rule = request("r1").to_rule(3);
        assert_eq!(rule.id.as_deref(), Some("r1"));
        assert_eq!(rule.priority, Some(3));
        assert_eq!(rule.filter.as_ref().unwrap().prefix.as_deref(), Some("/"));
        assert_eq!(rule.destination.bucket, "arn:aws:s3:::analytics-landing");
        assert_eq!(rule.destination.account.as_deref(), Some("222222222222"));
        assert_eq!(rule.destination.access_control_translation.as_ref().unwrap().owner, "Destination");
        assert_eq!(
            rule.delete_marker_replication,
            Some(DeleteMarkerReplication { status: RuleStatus::Enabled })
        );
        assert!(rule.replicates_sse_kms_objects());
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_rule_with_prefix() {
        let mut r = request("r1");
        r.filter_prefix = Some("Analysis/Voice/Redacted/".to_string());
        let rule = r.to_rule(1);
        assert_eq!(rule.filter.unwrap().prefix.as_deref(), Some("Analysis/Voice/Redacted/"));
    }

    #[test]
    fn test_next_priority() {
        assert_eq!(next_priority(None), Ok(1));

        let mut config = merge_rule(None, ROLE, request("a").to_rule(5)).unwrap();
        assert_eq!(next_priority(Some(&config)), Ok(6));

        config.rules[0].priority = None;
        assert_eq!(next_priority(Some(&config)), Ok(1));
    }

    #[test]
    fn test_next_priority_at_max() {
        let config = merge_rule(None, ROLE, request("a").to_rule(u32::MAX)).unwrap();
        assert_eq!(
            next_priority(Some(&config)),
            Err(ReplicationConfigError::PriorityOverflow(u32::MAX))
        );
    }

    #[test]
    fn test_merge_into_empty() {
        let config = merge_rule(None, ROLE, request("a").to_rule(1)).unwrap();
        assert_eq!(config.role, ROLE);
        assert_eq!(config.rules.len(), 1);
    }

    #[test]
    fn test_merge_preserves_existing_rules() {
        let first = merge_rule(None, ROLE, request("a").to_rule(1)).unwrap();
        let second =
            merge_rule(Some(&first), ROLE, request("b").to_rule(next_priority(Some(&first)).unwrap()))
                .unwrap();

        assert_eq!(second.rules.len(), 2);
        assert_eq!(second.rules[0], first.rules[0]);
        assert_eq!(second.rules[1].priority, Some(2));
    }

    #[test]
    fn test_merge_rejects_duplicate_id() {
        let first = merge_rule(None, ROLE, request("a").to_rule(1)).unwrap();
        let result = merge_rule(Some(&first), ROLE, request("a").to_rule(2));
        assert_eq!(result, Err(ReplicationConfigError::DuplicateRuleId("a".to_string())));
    }

    #[test]
    fn test_merge_rejects_duplicate_priority() {
        let first = merge_rule(None, ROLE, request("a").to_rule(1)).unwrap();
        let result = merge_rule(Some(&first), ROLE, request("b").to_rule(1));
        assert_eq!(result, Err(ReplicationConfigError::DuplicatePriority(1)));
    }

    #[test]
    fn test_request_from_toml() {
        let toml = r#"
rule_id = "data-analytics-connect-data-replication-rule-dev"
source_bucket = "acme-dev-storage"
filter_prefix = "Analysis/Voice/Redacted/"
source_key_arn = "arn:aws:kms:us-east-1:111111111111:key/source"
destination_account = "222222222222"
destination_bucket = "analytics-landing"
destination_key_arn = "arn:aws:kms:us-east-1:222222222222:key/dest"
"#;
        let r: RuleRequest = toml::from_str(toml).unwrap();
        assert_eq!(r.rule_id, "data-analytics-connect-data-replication-rule-dev");
        assert!(r.role_arn.is_none());
        assert!(r.validate().is_ok());
    }
}
