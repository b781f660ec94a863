// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Replication roles and the permissions granted to them.

use lineage_core::policy::{ManagedPolicy, PolicyDocument, Statement};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bucket::{bucket_arn, objects_arn, SourceBucket};

/// Service principal S3 replication assumes roles as.
pub const REPLICATION_SERVICE_PRINCIPAL: &str = "s3.amazonaws.com";

/// Description attached to every replication policy.
pub const REPLICATION_POLICY_DESCRIPTION: &str = "Replication Role Policy";

/// Returns the deterministic replication role name for a bucket.
#[must_use]
pub fn replication_role_name(bucket: &str) -> String {
    format!("{bucket}-replication-role")
}

/// Returns the ARN of an IAM role.
#[must_use]
pub fn role_arn(account: &str, name: &str) -> String {
    format!("arn:aws:iam::{account}:role/{name}")
}

/// An IAM role S3 assumes to replicate a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationRole {
    /// Role name.
    pub role_name: String,
    /// Role ARN.
    pub arn: String,
    /// Trust policy. `None` for roles managed elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_policy_document: Option<PolicyDocument>,
    /// Policies attached by this planner, in attachment order.
    #[serde(default)]
    pub managed_policies: Vec<ManagedPolicy>,
}

impl ReplicationRole {
    /// Creates the deterministic replication role of a bucket.
    #[must_use]
    pub fn for_bucket(bucket: &SourceBucket) -> Self {
        let role_name = replication_role_name(&bucket.name);
        Self {
            arn: role_arn(&bucket.account, &role_name),
            role_name,
            assume_role_policy_document: Some(PolicyDocument::new(vec![
                Statement::assume_role_by_service(REPLICATION_SERVICE_PRINCIPAL),
            ])),
            managed_policies: Vec::new(),
        }
    }

    /// References a role that already exists, by ARN.
    #[must_use]
    pub fn existing(arn: impl Into<String>) -> Self {
        let arn = arn.into();
        let role_name = arn.rsplit('/').next().unwrap_or_default().to_string();
        Self { role_name, arn, assume_role_policy_document: None, managed_policies: Vec::new() }
    }

    /// Attach a policy granting the permissions replication needs.
    ///
    /// Grants are additive: earlier policies stay attached. Granting the
    /// exact same permissions twice attaches a single policy.
    pub fn grant_replication_permissions(&mut self, grant: &ReplicationGrant) -> &ManagedPolicy {
        let document = grant.policy_document();
        if let Some(index) = self.managed_policies.iter().position(|p| p.policy_document == document)
        {
            debug!(role = %self.role_name, "Replication permissions already granted");
            return &self.managed_policies[index];
        }

        let policy_name = format!("{}-policy-{}", self.role_name, self.managed_policies.len() + 1);
        debug!(
            role = %self.role_name,
            policy = %policy_name,
            destination = %grant.destination_bucket,
            "Attaching replication policy"
        );
        self.managed_policies.push(ManagedPolicy {
            policy_name,
            description: REPLICATION_POLICY_DESCRIPTION.to_string(),
            policy_document: document,
        });
        &self.managed_policies[self.managed_policies.len() - 1]
    }

    /// Returns true if an attached policy allows `action` on `resource`.
    #[must_use]
    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.managed_policies.iter().any(|p| p.policy_document.allows(action, resource))
    }
}

/// What a replication role must be able to do for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationGrant {
    /// Source bucket name or ARN.
    pub source_bucket: String,
    /// Destination bucket name or ARN.
    pub destination_bucket: String,
    /// KMS key that encrypts source objects.
    pub source_key_arn: String,
    /// KMS key that encrypts replicas.
    pub destination_key_arn: String,
}

impl ReplicationGrant {
    /// Builds the least-privilege statements for this grant.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        vec![
            Statement::allow(
                ["s3:ListBucket", "s3:GetReplicationConfiguration"],
                [bucket_arn(&self.source_bucket)],
            ),
            Statement::allow(
                [
                    "s3:GetObjectVersion",
                    "s3:GetObjectVersionAcl",
                    "s3:GetObjectVersionTagging",
                    "s3:GetObjectVersionForReplication",
                    "s3:GetObjectLegalHold",
                    "s3:GetObjectRetention",
                ],
                [objects_arn(&self.source_bucket)],
            ),
            Statement::allow(
                [
                    "s3:ReplicateObject",
                    "s3:ReplicateDelete",
                    "s3:ReplicateTags",
                    "s3:GetObjectVersionTagging",
                    "s3:ObjectOwnerOverrideToBucketOwner",
                ],
                [objects_arn(&self.destination_bucket)],
            ),
            Statement::allow(["kms:Decrypt"], [self.source_key_arn.clone()]),
            Statement::allow(["kms:Encrypt"], [self.destination_key_arn.clone()]),
        ]
    }

    /// Builds the policy document for this grant.
    #[must_use]
    pub fn policy_document(&self) -> PolicyDocument {
        PolicyDocument::new(self.statements())
    }
}
