//! S3 event notifications.
//!
//! Only the members needed to locate the created object are modeled. Keys
//! arrive URL-encoded (`+` for space, `%XX` escapes) and are decoded before use.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::{RedactorError, Result};

/// An S3 event notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Event {
    /// Event records.
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

impl S3Event {
    /// Parse an event from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an S3 event notification.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(RedactorError::Event)
    }

    /// Builds an object-created event for the given objects.
    #[must_use]
    pub fn object_created<'a>(bucket: &str, keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            records: keys
                .into_iter()
                .map(|key| S3EventRecord {
                    event_name: Some("ObjectCreated:Put".to_string()),
                    s3: S3Entity {
                        bucket: S3Bucket { name: bucket.to_string() },
                        object: S3Object { key: key.to_string(), size: None },
                    },
                })
                .collect(),
        }
    }
}

/// A single event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3EventRecord {
    /// Event name (e.g. `ObjectCreated:Put`).
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Bucket and object the event refers to.
    pub s3: S3Entity,
}

impl S3EventRecord {
    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.s3.bucket.name
    }

    /// Returns the decoded object key.
    #[must_use]
    pub fn key(&self) -> String {
        decode_key(&self.s3.object.key)
    }
}

/// The `s3` member of an event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Entity {
    /// Bucket.
    pub bucket: S3Bucket,
    /// Object.
    pub object: S3Object,
}

/// Bucket of an event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Bucket {
    /// Bucket name.
    pub name: String,
}

/// Object of an event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Object {
    /// URL-encoded object key.
    pub key: String,
    /// Object size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Decodes a key from an S3 event notification.
///
/// Undecodable escapes (invalid UTF-8) leave the key as received.
#[must_use]
pub fn decode_key(key: &str) -> String {
    let spaced = key.replace('+', " ");
    let decoded = percent_decode_str(&spaced).decode_utf8().map(|s| s.into_owned());
    decoded.unwrap_or(spaced)
}
