// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Recording-location rewriting.
//!
//! A recording location such as
//! `acme-dev-storage/connect/acme-dev/acme-dev-recordings/2024/01/01/abc123.wav`
//! becomes
//! `acme-dev-storage/Analysis/Voice/Redacted/2024/01/01/abc123_call_recording_redacted_<ts>.wav`.
//!
//! Substitution is literal. A location that does not contain the source
//! segment is left alone, which makes rewriting idempotent.

use lineage_core::ctr::ContactTraceRecord;
use lineage_core::RedactorConfig;

use crate::error::RewriteError;

/// Returns the last path segment of a key or location.
#[must_use]
pub fn object_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Returns the file name redacted audio is published under.
#[must_use]
pub fn redacted_file_name(contact_id: &str, connected_to_agent: &str) -> String {
    format!("{contact_id}_call_recording_redacted_{connected_to_agent}.wav")
}

/// Returns `key` with its first `segment` path segment removed.
///
/// `None` if the key has no such segment, or nothing would be left.
#[must_use]
pub fn published_key(key: &str, segment: &str) -> Option<String> {
    let mut parts: Vec<&str> = key.split('/').collect();
    let index = parts.iter().position(|p| *p == segment)?;
    parts.remove(index);
    let published = parts.join("/");
    (!published.is_empty()).then_some(published)
}

/// Rewrites recording locations from the source layout to the redacted one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRewrite {
    source: String,
    redacted: String,
}

impl LocationRewrite {
    /// Creates a rewrite replacing `source` with `redacted`.
    #[must_use]
    pub fn new(source: impl Into<String>, redacted: impl Into<String>) -> Self {
        Self { source: source.into(), redacted: redacted.into() }
    }

    /// Creates the rewrite configured for a deployment.
    #[must_use]
    pub fn from_config(config: &RedactorConfig) -> Self {
        Self::new(config.source_segment(), config.redacted_segment())
    }

    /// Segment searched for.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Segment written in its place.
    #[must_use]
    pub fn redacted(&self) -> &str {
        &self.redacted
    }

    /// Rewrites a single location.
    ///
    /// Returns `None` when the location does not contain the source segment.
    /// Otherwise every occurrence is replaced and the trailing file name is
    /// swapped for `file_name`.
    #[must_use]
    pub fn rewrite_location(&self, location: &str, file_name: &str) -> Option<String> {
        if self.source.is_empty() || !location.contains(&self.source) {
            return None;
        }

        let old_name = object_name(location);
        let mut rewritten = location.replace(&self.source, &self.redacted);
        if !old_name.is_empty() {
            if let Some(at) = rewritten.rfind(old_name) {
                rewritten.replace_range(at..at + old_name.len(), file_name);
            }
        }
        Some(rewritten)
    }

    /// Rewrites every recording location of a record in place.
    ///
    /// Records no agent handled are left untouched. Returns the number of
    /// locations rewritten. On error the record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the record was handled by an agent but has no
    /// `ContactId`.
    pub fn apply(&self, ctr: &mut ContactTraceRecord) -> Result<usize, RewriteError> {
        let Some(connected) = ctr.connected_to_agent_timestamp() else {
            return Ok(0);
        };
        let contact_id = ctr.contact_id().ok_or(RewriteError::MissingContactId)?;
        let file_name = redacted_file_name(contact_id, connected);

        let mut rewritten = 0;
        for location in ctr.locations_mut() {
            if let Some(new) = self.rewrite_location(location, &file_name) {
                *location = new;
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}
