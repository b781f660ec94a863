//! Kinesis Data Firehose newline-delimiter transform.
//!
//! Firehose concatenates records without separators. This transform appends
//! `\n` to every record so delivered objects are newline-delimited batches.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// A Firehose transformation invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirehoseEvent {
    /// Records to transform.
    #[serde(default)]
    pub records: Vec<FirehoseRecord>,
    /// Other invocation members (e.g. `invocationId`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirehoseRecord {
    /// Record identifier, echoed back in the response.
    #[serde(rename = "recordId")]
    pub record_id: String,
    /// Base64-encoded payload.
    pub data: String,
    /// Other record members, echoed back in the response.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Transformation status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformResult {
    /// The record was transformed.
    Ok,
    /// The record was intentionally dropped.
    Dropped,
    /// The record could not be transformed.
    ProcessingFailed,
}

/// A transformed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirehoseResultRecord {
    /// Identifier of the input record.
    #[serde(rename = "recordId")]
    pub record_id: String,
    /// Transformation status.
    pub result: TransformResult,
    /// Base64-encoded payload.
    pub data: String,
    /// Other members of the input record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The transformation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirehoseResponse {
    /// Transformed records, in input order.
    pub records: Vec<FirehoseResultRecord>,
}

/// Appends a newline to every record's payload.
///
/// A record whose payload is not valid base64 is returned unchanged and
/// marked `ProcessingFailed`.
#[must_use]
pub fn newline_delimit(event: FirehoseEvent) -> FirehoseResponse {
    info!(records = event.records.len(), "Processing trace records");

    let records = event
        .records
        .into_iter()
        .map(|record| match STANDARD.decode(&record.data) {
            Ok(mut payload) => {
                payload.push(b'\n');
                debug!(record_id = %record.record_id, size = payload.len(), "Processed record");
                FirehoseResultRecord {
                    record_id: record.record_id,
                    result: TransformResult::Ok,
                    data: STANDARD.encode(payload),
                    extra: record.extra,
                }
            }
            Err(e) => {
                warn!(record_id = %record.record_id, error = %e, "Record data is not base64");
                FirehoseResultRecord {
                    record_id: record.record_id,
                    result: TransformResult::ProcessingFailed,
                    data: record.data,
                    extra: record.extra,
                }
            }
        })
        .collect();

    FirehoseResponse { records }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_newline() {
        let event: FirehoseEvent = serde_json::from_value(serde_json::json!({
            "invocationId": "inv-1",
            "deliveryStreamArn": "arn:aws:firehose:us-east-1:111111111111:deliverystream/ctr",
            "records": [
                { "recordId": "r1", "approximateArrivalTimestamp": 1700000000000_u64,
                  "data": STANDARD.encode(r#"{"ContactId":"abc"}"#) },
                { "recordId": "r2", "data": "" }
            ]
        }))
        .unwrap();

        let response = newline_delimit(event);
        assert_eq!(response.records.len(), 2);

        let first = &response.records[0];
        assert_eq!(first.result, TransformResult::Ok);
        assert_eq!(STANDARD.decode(&first.data).unwrap(), b"{\"ContactId\":\"abc\"}\n");
        assert_eq!(first.extra["approximateArrivalTimestamp"], 1_700_000_000_000_u64);

        assert_eq!(STANDARD.decode(&response.records[1].data).unwrap(), b"\n");
    }

    #[test]
    fn test_invalid_base64_fails_record() {
        let event = FirehoseEvent {
            records: vec![FirehoseRecord {
                record_id: "r1".to_string(),
                data: "not base64!".to_string(),
                extra: Map::new(),
            }],
            extra: Map::new(),
        };

        let response = newline_delimit(event);
        assert_eq!(response.records[0].result, TransformResult::ProcessingFailed);
        assert_eq!(response.records[0].data, "not base64!");
    }

    #[test]
    fn test_response_shape() {
        let response = newline_delimit(FirehoseEvent {
            records: vec![FirehoseRecord {
                record_id: "r1".to_string(),
                data: STANDARD.encode("x"),
                extra: Map::new(),
            }],
            extra: Map::new(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["records"][0]["recordId"], "r1");
        assert_eq!(json["records"][0]["result"], "Ok");
        assert_eq!(json["records"][0]["data"], STANDARD.encode("x\n"));
    }

    #[test]
    fn test_empty_event() {
        let event: FirehoseEvent = serde_json::from_str("{}").unwrap();
        assert!(newline_delimit(event).records.is_empty());
    }
}
