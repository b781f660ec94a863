// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Core types and utilities for Lineage.
//!
//! This crate provides the building blocks shared by the replication planner
//! and the trace-record redactor:
//! - Configuration management
//! - Error types
//! - S3 replication configuration and IAM policy documents
//! - The Contact Trace Record schema

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod ctr;
pub mod error;
pub mod policy;
pub mod replication;

pub use config::{AwsConfig, Config, LogFormat, LoggingConfig, RedactorConfig};
pub use error::{Error, Result};
