// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Trace-record redactor.
//!
//! Handles object-created notifications for CTR batches landing under an
//! `original/` prefix: each batch is rewritten and published next to it with
//! the `original` segment removed from the key.

use bytes::Bytes;
use lineage_core::RedactorConfig;
use tracing::{error, info};

use crate::batch::{redact_batch, BatchStats};
use crate::error::{RedactorError, Result};
use crate::event::S3Event;
use crate::rewrite::{object_name, published_key, LocationRewrite};
use crate::store::ObjectStore;

/// Outcome of one processed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReport {
    /// Bucket name.
    pub bucket: String,
    /// Input key.
    pub key: String,
    /// Key the rewritten batch was written to.
    pub output_key: String,
    /// Line counts.
    pub stats: BatchStats,
}

/// Outcome of one event.
#[derive(Debug, Default)]
pub struct EventReport {
    /// Objects written.
    pub processed: Vec<ObjectReport>,
    /// Objects skipped, with the key and reason.
    pub failed: Vec<(String, RedactorError)>,
}

impl EventReport {
    /// Returns true if every object was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Rewrites recording locations in trace-record batches.
#[derive(Debug)]
pub struct TraceRecordRedactor<S> {
    store: S,
    rewrite: LocationRewrite,
    original_segment: String,
}

impl<S: ObjectStore> TraceRecordRedactor<S> {
    /// Creates a redactor reading and writing through `store`.
    pub fn new(store: S, config: &RedactorConfig) -> Self {
        Self {
            store,
            rewrite: LocationRewrite::from_config(config),
            original_segment: config.original_segment.clone(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the location rewrite in use.
    pub fn rewrite(&self) -> &LocationRewrite {
        &self.rewrite
    }

    /// Rewrites one object and writes the result under its published key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key has no `original` segment, the object
    /// cannot be fetched or written, or its body is not UTF-8. Malformed
    /// lines are not errors; they are skipped and counted.
    pub async fn process_object(&self, bucket: &str, key: &str) -> Result<ObjectReport> {
        let output_key = published_key(key, &self.original_segment).ok_or_else(|| {
            RedactorError::NoOriginalSegment {
                key: key.to_string(),
                segment: self.original_segment.clone(),
            }
        })?;
        info!(bucket, key, object = object_name(key), "Processing object");

        let body = self.store.get_object(bucket, key).await?;
        let contents = std::str::from_utf8(&body).map_err(|source| RedactorError::NotUtf8 {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })?;

        let batch = redact_batch(contents, &self.rewrite);
        self.store.put_object(bucket, &output_key, Bytes::from(batch.body)).await?;

        info!(
            bucket,
            key,
            output_key = %output_key,
            lines = batch.stats.lines,
            rewritten = batch.stats.rewritten,
            skipped = batch.stats.skipped,
            "Wrote redacted batch"
        );
        Ok(ObjectReport {
            bucket: bucket.to_string(),
            key: key.to_string(),
            output_key,
            stats: batch.stats,
        })
    }

    /// Processes every object named by an event, in order.
    ///
    /// A failing object is logged and recorded; the remaining objects are
    /// still processed.
    pub async fn handle_event(&self, event: &S3Event) -> EventReport {
        info!(records = event.records.len(), "Handling S3 event");
        let mut report = EventReport::default();

        for record in &event.records {
            let key = record.key();
            match self.process_object(record.bucket(), &key).await {
                Ok(object) => report.processed.push(object),
                Err(e) => {
                    error!(bucket = record.bucket(), key = %key, error = %e, "Unable to process object");
                    report.failed.push((key, e));
                }
            }
        }
        report
    }
}
