// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Cross-account S3 replication planning for Lineage.
//!
//! Builds replication rules, the per-bucket replication role and its
//! least-privilege policies, and merges new rules onto a bucket's existing
//! replication configuration without disturbing the rules already there.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bucket;
pub mod error;
pub mod manager;
pub mod plan;
pub mod role;
pub mod rule;
pub mod xml;

pub use bucket::SourceBucket;
pub use error::{ReplicationError, Result};
pub use manager::{PlanOutput, ReplicationRuleManager};
pub use plan::{compile, parse_existing, BucketPlan, PlanFile, ReplicationPlan};
pub use role::{ReplicationGrant, ReplicationRole};
pub use rule::{merge_rule, next_priority, RuleRequest};
pub use xml::replication_configuration_xml;
