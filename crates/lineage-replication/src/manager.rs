// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Replication rule manager.
//!
//! Registers one replication role per source bucket and merges rules onto the
//! bucket's existing replication configuration. All state is in memory; the
//! manager is a one-shot planner run at deployment time.

use std::collections::BTreeMap;

use lineage_core::replication::{ReplicationConfigError, ReplicationRule};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bucket::SourceBucket;
use crate::error::{ReplicationError, Result};
use crate::role::{replication_role_name, role_arn, ReplicationRole};
use crate::rule::{merge_rule, next_priority, RuleRequest};

/// A value the planner exports for operators, such as a role ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanOutput {
    /// Exported value.
    pub value: String,
    /// What the value is.
    pub description: String,
}

/// Builds and merges cross-account replication for source buckets.
#[derive(Debug, Default)]
pub struct ReplicationRuleManager {
    /// Replication role per source bucket name.
    roles: BTreeMap<String, ReplicationRole>,
    /// Role ARN output per source bucket name.
    outputs: BTreeMap<String, PlanOutput>,
}

impl ReplicationRuleManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replication role for a bucket, creating it on first use.
    ///
    /// An `existing` role is returned unchanged and becomes the bucket's role.
    /// Otherwise the role already registered for the bucket is returned, or
    /// `<bucket>-replication-role` is created. A bucket never gets two roles.
    pub fn ensure_replication_role(
        &mut self,
        bucket: &SourceBucket,
        existing: Option<ReplicationRole>,
    ) -> &mut ReplicationRole {
        match existing {
            Some(role) => {
                let registered = self.roles.get(&bucket.name);
                if registered.is_some_and(|r| r.arn == role.arn) {
                    debug!(bucket = %bucket.name, role = %role.arn, "Reusing registered role");
                } else {
                    if let Some(previous) = registered {
                        warn!(
                            bucket = %bucket.name,
                            previous = %previous.arn,
                            role = %role.arn,
                            "Replacing replication role for bucket"
                        );
                    }
                    self.roles.insert(bucket.name.clone(), role);
                }
            }
            None => {
                if !self.roles.contains_key(&bucket.name) {
                    let role = ReplicationRole::for_bucket(bucket);
                    info!(bucket = %bucket.name, role = %role.role_name, "Creating replication role");
                    self.roles.insert(bucket.name.clone(), role);
                }
            }
        }

        self.roles.entry(bucket.name.clone()).or_insert_with(|| ReplicationRole::for_bucket(bucket))
    }

    /// Adds a replication rule to a source bucket.
    ///
    /// The request is validated, the merged configuration (existing rules
    /// plus the new one at priority `max + 1`) is validated, and only then is
    /// anything changed: the bucket's role is ensured and granted the rule's
    /// permissions, the merged configuration is written to the bucket and
    /// versioning is enabled.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing identifier, a duplicate
    /// rule ID or priority, no priority left above the existing ones, or a
    /// request naming a different bucket. The bucket and manager are left
    /// untouched on error.
    pub fn add_replication_rule(
        &mut self,
        bucket: &mut SourceBucket,
        request: &RuleRequest,
    ) -> Result<ReplicationRule> {
        validate_bucket(bucket)?;
        request.validate().map_err(|e| ReplicationError::configuration(&bucket.name, e))?;
        if request.source_bucket != bucket.name {
            return Err(ReplicationError::UnknownBucket {
                rule_id: request.rule_id.clone(),
                bucket: request.source_bucket.clone(),
            });
        }

        let role_arn = self.planned_role_arn(bucket, request.role_arn.as_deref());
        let priority = next_priority(bucket.replication.as_ref())
            .map_err(|e| ReplicationError::configuration(&bucket.name, e))?;
        let rule = request.to_rule(priority);
        let merged = merge_rule(bucket.replication.as_ref(), &role_arn, rule.clone())
            .map_err(|e| ReplicationError::configuration(&bucket.name, e))?;

        let existing = request.role_arn.clone().map(ReplicationRole::existing);
        let role = self.ensure_replication_role(bucket, existing);
        role.grant_replication_permissions(&request.grant());
        let role_arn = role.arn.clone();

        bucket.replication = Some(merged);
        if bucket.enable_versioning() {
            debug!(bucket = %bucket.name, "Enabled versioning");
        }

        self.outputs.insert(
            bucket.name.clone(),
            PlanOutput {
                value: role_arn,
                description: format!("Replication Role for: {}", bucket.name),
            },
        );

        info!(
            bucket = %bucket.name,
            rule_id = %request.rule_id,
            priority,
            destination = %request.destination_bucket,
            "Added replication rule"
        );
        Ok(rule)
    }

    /// Returns the role registered for a bucket.
    #[must_use]
    pub fn role(&self, bucket: &str) -> Option<&ReplicationRole> {
        self.roles.get(bucket)
    }

    /// Returns every registered role, keyed by bucket name.
    #[must_use]
    pub fn roles(&self) -> &BTreeMap<String, ReplicationRole> {
        &self.roles
    }

    /// Returns the role ARN output of a bucket.
    #[must_use]
    pub fn output(&self, bucket: &str) -> Option<&PlanOutput> {
        self.outputs.get(bucket)
    }

    /// Role ARN the bucket's configuration will reference, without registering anything.
    fn planned_role_arn(&self, bucket: &SourceBucket, existing: Option<&str>) -> String {
        if let Some(arn) = existing {
            return arn.to_string();
        }
        match self.roles.get(&bucket.name) {
            Some(role) => role.arn.clone(),
            None => role_arn(&bucket.account, &replication_role_name(&bucket.name)),
        }
    }
}

fn validate_bucket(bucket: &SourceBucket) -> Result<()> {
    if bucket.name.trim().is_empty() {
        return Err(ReplicationError::configuration(
            &bucket.name,
            ReplicationConfigError::MissingIdentifier("bucket name"),
        ));
    }
    if bucket.account.trim().is_empty() {
        return Err(ReplicationError::configuration(
            &bucket.name,
            ReplicationConfigError::MissingIdentifier("bucket account"),
        ));
    }
    Ok(())
}
