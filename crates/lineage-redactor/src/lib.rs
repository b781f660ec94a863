// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Contact Trace Record redaction for Lineage.
//!
//! After recordings are redacted and moved, the trace records that point at
//! them still carry the old locations. This crate rewrites those locations
//! in newline-delimited CTR batches:
//! - [`rewrite`]: literal location and file-name rewriting
//! - [`batch`]: line-by-line batch processing with per-line error isolation
//! - [`redactor`]: the S3-event-driven object handler
//! - [`store`] and [`s3`]: object store trait, in-memory and S3 implementations
//! - [`firehose`]: the Firehose newline-delimiter transform

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod error;
pub mod event;
pub mod firehose;
pub mod redactor;
pub mod rewrite;
pub mod s3;
pub mod store;

pub use batch::{redact_batch, BatchStats, RedactedBatch};
pub use error::{RecordError, RedactorError, Result, RewriteError, StoreError};
pub use event::S3Event;
pub use firehose::{newline_delimit, FirehoseEvent, FirehoseResponse};
pub use redactor::{EventReport, ObjectReport, TraceRecordRedactor};
pub use rewrite::{published_key, LocationRewrite};
pub use s3::S3ObjectStore;
pub use store::{MemoryObjectStore, ObjectStore};
