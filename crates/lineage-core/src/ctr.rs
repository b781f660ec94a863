// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Contact Trace Record schema.
//!
//! Only the fields the redactor reads or rewrites are modeled. Everything
//! else lands in a catch-all map, and explicit `null`s are remembered, so a
//! record re-serializes without losing anything it did not understand.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A JSON member that may be absent, explicitly `null`, or set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// The member does not appear in the document.
    Missing,
    /// The member appears with a `null` value.
    Null,
    /// The member appears with a value.
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> Field<T> {
    /// Returns true if the member does not appear in the document.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the value, treating `null` as absent.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Null => None,
        }
    }

    /// Returns the value mutably, treating `null` as absent.
    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Null => None,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Missing | Self::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Value(v),
            None => Self::Null,
        })
    }
}

/// A Contact Trace Record as emitted by Amazon Connect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactTraceRecord {
    /// Identifier of the contact.
    #[serde(rename = "ContactId", default, skip_serializing_if = "Field::is_missing")]
    pub contact_id: Field<String>,

    /// Agent that handled the contact.
    #[serde(rename = "Agent", default, skip_serializing_if = "Field::is_missing")]
    pub agent: Field<Agent>,

    /// Legacy single recording.
    #[serde(rename = "Recording", default, skip_serializing_if = "Field::is_missing")]
    pub recording: Field<Recording>,

    /// All recordings of the contact.
    #[serde(rename = "Recordings", default, skip_serializing_if = "Field::is_missing")]
    pub recordings: Field<Vec<Recording>>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContactTraceRecord {
    /// Parse one line of a newline-delimited batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a JSON object of CTR shape.
    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Serialize to a single line (no trailing newline).
    ///
    /// # Errors
    ///
    /// Returns an error if an extra field cannot be serialized.
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Returns the contact ID, if present.
    #[must_use]
    pub fn contact_id(&self) -> Option<&str> {
        self.contact_id.value().map(String::as_str)
    }

    /// Returns when the contact was connected to an agent.
    ///
    /// Only contacts an agent actually handled carry this timestamp.
    #[must_use]
    pub fn connected_to_agent_timestamp(&self) -> Option<&str> {
        self.agent.value().and_then(|a| a.connected_to_agent_timestamp.value()).map(String::as_str)
    }

    /// Returns every recording location, `Recording` first.
    pub fn locations(&self) -> impl Iterator<Item = &String> {
        let single = self.recording.value().and_then(|r| r.location.value());
        let many = self.recordings.value().into_iter().flatten().filter_map(|r| r.location.value());
        single.into_iter().chain(many)
    }

    /// Returns every recording location mutably, `Recording` first.
    pub fn locations_mut(&mut self) -> impl Iterator<Item = &mut String> {
        let single = self.recording.value_mut().and_then(|r| r.location.value_mut());
        let many = self
            .recordings
            .value_mut()
            .into_iter()
            .flatten()
            .filter_map(|r| r.location.value_mut());
        single.into_iter().chain(many)
    }
}

/// Agent section of a CTR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// When the contact was connected to the agent.
    #[serde(
        rename = "ConnectedToAgentTimestamp",
        default,
        skip_serializing_if = "Field::is_missing"
    )]
    pub connected_to_agent_timestamp: Field<String>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A recording reference, used for both `Recording` and `Recordings[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Storage path of the recording (`bucket/key`).
    #[serde(rename = "Location", default, skip_serializing_if = "Field::is_missing")]
    pub location: Field<String>,

    /// Recording status (e.g. `AVAILABLE`).
    #[serde(rename = "Status", default, skip_serializing_if = "Field::is_missing")]
    pub status: Field<String>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
