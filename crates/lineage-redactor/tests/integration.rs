// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Integration tests for trace-record redaction.

use lineage_core::{Config, RedactorConfig};
use lineage_redactor::{
    redact_batch, LocationRewrite, MemoryObjectStore, RecordError, RedactorError, S3Event,
    TraceRecordRedactor,
};
use serde_json::Value;

const BUCKET: &str = "acme-dev-storage";
const INPUT_KEY: &str = "original/ctr/2024/01/01/batch.json";
const OUTPUT_KEY: &str = "ctr/2024/01/01/batch.json";

fn handled(contact_id: &str) -> String {
    format!(
        r#"{{"AWSAccountId":"111111111111","Agent":{{"ARN":"arn:agent","ConnectedToAgentTimestamp":"2024-01-01T10:00:05Z","Username":"jdoe"}},"ContactId":"{contact_id}","Recording":{{"Location":"acme-dev-storage/connect/acme-dev/acme-dev-recordings/2024/01/01/{contact_id}.wav","Status":"AVAILABLE","Type":"AUDIO","DeletionReason":null}},"Recordings":[{{"Location":"acme-dev-storage/connect/acme-dev/acme-dev-recordings/2024/01/01/{contact_id}.wav","MediaStreamType":"AUDIO","Status":"AVAILABLE"}}],"Queue":null}}"#
    )
}

fn unhandled(contact_id: &str) -> String {
    format!(
        r#"{{"ContactId":"{contact_id}","Channel":"VOICE","Agent":null,"Recording":null,"DisconnectReason":"CUSTOMER_DISCONNECT"}}"#
    )
}

fn redactor() -> TraceRecordRedactor<MemoryObjectStore> {
    TraceRecordRedactor::new(MemoryObjectStore::new(), &RedactorConfig::for_prefix("acme-dev"))
}

fn output(redactor: &TraceRecordRedactor<MemoryObjectStore>, key: &str) -> String {
    let body = redactor.store().get(BUCKET, key).expect("output object");
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_rewrites_recording_locations() {
    let redactor = redactor();
    redactor.store().insert(BUCKET, INPUT_KEY, format!("{}\n", handled("abc123")));

    let event = S3Event::object_created(BUCKET, [INPUT_KEY]);
    let report = redactor.handle_event(&event).await;
    assert!(report.is_success());
    assert_eq!(report.processed[0].output_key, OUTPUT_KEY);

    let out = output(&redactor, OUTPUT_KEY);
    let record: Value = serde_json::from_str(out.trim_end()).unwrap();
    let location = record["Recording"]["Location"].as_str().unwrap();
    assert!(location.contains("Analysis/Voice/Redacted"));
    assert!(location.ends_with("abc123_call_recording_redacted_2024-01-01T10:00:05Z.wav"));
    assert_eq!(record["Recordings"][0]["Location"], location);

    // Everything else survives, including explicit nulls.
    assert_eq!(record["Agent"]["Username"], "jdoe");
    assert_eq!(record["Recording"]["DeletionReason"], Value::Null);
    assert_eq!(record["Queue"], Value::Null);
    assert_eq!(record["AWSAccountId"], "111111111111");
}

#[tokio::test]
async fn test_unhandled_records_pass_through() {
    let redactor = redactor();
    let contents = format!("{}\n{}\n", unhandled("c1"), unhandled("c2"));
    redactor.store().insert(BUCKET, INPUT_KEY, contents.clone());

    redactor.process_object(BUCKET, INPUT_KEY).await.unwrap();
    assert_eq!(output(&redactor, OUTPUT_KEY), contents);
}

#[tokio::test]
async fn test_malformed_line_is_dropped() {
    let redactor = redactor();
    let lines = [
        handled("a1"),
        unhandled("a2"),
        r#"{"ContactId":"a3","Agent":"#.to_string(),
        handled("a4"),
        unhandled("a5"),
    ];
    redactor.store().insert(BUCKET, INPUT_KEY, lines.join("\n"));

    let report = redactor.process_object(BUCKET, INPUT_KEY).await.unwrap();
    assert_eq!(report.stats.lines, 5);
    assert_eq!(report.stats.skipped, 1);

    let out = output(&redactor, OUTPUT_KEY);
    assert_eq!(out.lines().count(), lines.len() - 1);
    assert!(!out.contains("\"a3\""));
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let redactor = redactor();
    let contents = format!("{}\n{}\n{}\n", handled("x1"), unhandled("x2"), handled("x3"));
    redactor.store().insert(BUCKET, INPUT_KEY, contents);
    redactor.process_object(BUCKET, INPUT_KEY).await.unwrap();
    let first = output(&redactor, OUTPUT_KEY);

    redactor.store().insert(BUCKET, "original/rerun.json", first.clone());
    let report = redactor.process_object(BUCKET, "original/rerun.json").await.unwrap();
    assert_eq!(report.stats.rewritten, 0);
    assert_eq!(output(&redactor, "rerun.json"), first);
}

#[tokio::test]
async fn test_failed_object_does_not_stop_event() {
    let redactor = redactor();
    redactor.store().insert(BUCKET, "original/a.json", handled("a"));
    redactor.store().insert(BUCKET, "ctr/no-segment.json", handled("b"));
    redactor.store().insert(BUCKET, "original/binary.json", vec![0xc3, 0x28]);
    redactor.store().insert(BUCKET, "original/c.json", handled("c"));

    let event = S3Event::object_created(
        BUCKET,
        ["original/a.json", "ctr/no-segment.json", "original/binary.json", "original/missing.json", "original/c.json"],
    );
    let report = redactor.handle_event(&event).await;

    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.failed.len(), 3);
    assert!(matches!(report.failed[0].1, RedactorError::NoOriginalSegment { .. }));
    assert!(matches!(report.failed[1].1, RedactorError::NotUtf8 { .. }));
    assert!(matches!(report.failed[2].1, RedactorError::Store(_)));
    assert!(redactor.store().get(BUCKET, "a.json").is_some());
    assert!(redactor.store().get(BUCKET, "c.json").is_some());
}

#[tokio::test]
async fn test_event_keys_are_decoded() {
    let redactor = redactor();
    redactor.store().insert(BUCKET, "original/ctr/batch 1.json", handled("d1"));

    let event = S3Event::from_json(
        r#"{"Records":[{"s3":{"bucket":{"name":"acme-dev-storage"},"object":{"key":"original/ctr/batch+1.json"}}}]}"#,
    )
    .unwrap();
    let report = redactor.handle_event(&event).await;

    assert!(report.is_success());
    assert!(redactor.store().get(BUCKET, "ctr/batch 1.json").is_some());
}

#[test]
fn test_configured_segments() {
    let mut config = Config::default();
    config.apply_env(|name| match name {
        "PREFIX" => Some("acme-prod".to_string()),
        "STORAGE_BUCKET" => Some("acme-prod-storage".to_string()),
        _ => None,
    });
    config.validate().unwrap();

    let rewrite = LocationRewrite::from_config(&config.redactor);
    let line = r#"{"ContactId":"p1","Agent":{"ConnectedToAgentTimestamp":"T"},"Recording":{"Location":"acme-prod-storage/connect/acme-prod/acme-prod-recordings/p1.wav"}}"#;
    let batch = redact_batch(line, &rewrite);
    assert!(batch.body.contains(
        "\"acme-prod-storage/Analysis/Voice/Redacted/p1_call_recording_redacted_T.wav\""
    ));
}

#[test]
fn test_agent_record_without_contact_id_is_skipped() {
    let rewrite = LocationRewrite::from_config(&RedactorConfig::for_prefix("acme-dev"));
    let contents = format!(
        "{}\n{}\n",
        r#"{"Agent":{"ConnectedToAgentTimestamp":"T"},"Recording":{"Location":"connect/acme-dev/acme-dev-recordings/x.wav"}}"#,
        unhandled("ok")
    );

    let batch = redact_batch(&contents, &rewrite);
    assert_eq!(batch.body, format!("{}\n", unhandled("ok")));
    assert!(matches!(batch.errors.as_slice(), [RecordError::Rewrite { line: 0, .. }]));
}
