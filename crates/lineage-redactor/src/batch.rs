//! Newline-delimited trace-record batches.

use lineage_core::ctr::ContactTraceRecord;
use tracing::{debug, warn};

use crate::error::RecordError;
use crate::rewrite::LocationRewrite;

/// Line counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Non-blank lines read.
    pub lines: usize,
    /// Records with at least one location rewritten.
    pub rewritten: usize,
    /// Records emitted unchanged.
    pub unchanged: usize,
    /// Lines dropped because of a record error.
    pub skipped: usize,
}

/// A rewritten batch.
#[derive(Debug, Default)]
pub struct RedactedBatch {
    /// Output body: one record per line, each terminated by `\n`.
    pub body: String,
    /// Line counts.
    pub stats: BatchStats,
    /// Errors for the skipped lines, in line order.
    pub errors: Vec<RecordError>,
}

/// Rewrites every record of a newline-delimited batch.
///
/// Blank lines are ignored. A line that fails is logged and left out of the
/// output; it never aborts the batch. Records that need no rewrite are
/// emitted exactly as read.
#[must_use]
pub fn redact_batch(contents: &str, rewrite: &LocationRewrite) -> RedactedBatch {
    let mut batch = RedactedBatch { body: String::with_capacity(contents.len()), ..Default::default() };

    for (index, line) in contents.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        batch.stats.lines += 1;

        match redact_line(index, line, rewrite) {
            Ok(Some(rewritten)) => {
                batch.body.push_str(&rewritten);
                batch.stats.rewritten += 1;
            }
            Ok(None) => {
                batch.body.push_str(line);
                batch.stats.unchanged += 1;
            }
            Err(e) => {
                warn!(line = index, error = %e, "Skipping trace record");
                batch.stats.skipped += 1;
                batch.errors.push(e);
                continue;
            }
        }
        batch.body.push('\n');
    }

    debug!(
        lines = batch.stats.lines,
        rewritten = batch.stats.rewritten,
        skipped = batch.stats.skipped,
        "Redacted batch"
    );
    batch
}

/// Rewrites one line. `None` means the line is emitted as read.
fn redact_line(
    index: usize,
    line: &str,
    rewrite: &LocationRewrite,
) -> Result<Option<String>, RecordError> {
    let mut ctr = ContactTraceRecord::from_line(line)
        .map_err(|source| RecordError::Malformed { line: index, source })?;

    let count =
        rewrite.apply(&mut ctr).map_err(|source| RecordError::Rewrite { line: index, source })?;
    if count == 0 {
        return Ok(None);
    }

    ctr.to_line().map(Some).map_err(|source| RecordError::Serialize { line: index, source })
}
