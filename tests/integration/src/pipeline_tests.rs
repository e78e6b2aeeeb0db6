//! Pipeline Tests - raw MQTT bytes to served snapshot
//!
//! # Test Scenarios
//!
//! 1. **Normal operation**: both zones report and the totals add up
//! 2. **Forgery**: tampered counts, wrong keys and unknown sources are dropped
//! 3. **Message loss**: a skipped link is flagged yet the message is applied
//! 4. **Capacity edge**: the alert fires once per transition into zero
//! 5. **Fallback resync**: the reserved node can restore the primary count

use crate::test_utils::*;
use parkwatch_crypto::compute_signature;
use parkwatch_domain::{Count, OverrideRequest};
use parkwatch_stream::{ChainStatus, IngestError};
use serde_json::json;
use std::time::{Duration, Instant};

#[test]
fn test_both_zones_report() {
    init_tracing();
    let (state, sink) = test_occupancy();
    let mut a1 = SensorNode::primary();
    let mut pmr = SensorNode::reserved();

    let outcome = state.ingest_bytes(&a1.next(12)).unwrap();
    assert_eq!(outcome.chain, ChainStatus::Linked);
    assert_eq!(outcome.totals.total, 12);

    let outcome = state.ingest_bytes(&pmr.next(3)).unwrap();
    assert_eq!(outcome.totals.total, 15);
    assert_eq!(outcome.totals.reserved, 3);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.total_free, Count::Known(15));
    assert_eq!(snapshot.handicap_free, Count::Known(3));
    assert!(snapshot.connected);

    let metrics = state.metrics();
    assert_eq!(metrics.accepted, 2);
    assert_eq!(metrics.rejected(), 0);
    assert!(sink.alerts().is_empty());
}

#[test]
fn test_reference_message_accepted() {
    let (state, _sink) = test_occupancy();
    let bytes = br#"{"source":"A1","data":"7|A1|12|0000000000000000:9837429d07040d9c"}"#;

    let outcome = state.ingest_bytes(bytes).unwrap();
    assert_eq!(outcome.sequence, 7);
    assert_eq!(outcome.chain, ChainStatus::Linked);
    assert_eq!(state.last_signature("A1").as_deref(), Some("9837429d07040d9c"));

    let follow_up = br#"{"source":"A1","data":"8|A1|11|9837429d07040d9c:07d41713634c653e"}"#;
    let outcome = state.ingest_bytes(follow_up).unwrap();
    assert_eq!(outcome.chain, ChainStatus::Linked);
    assert_eq!(outcome.totals.total, 11);
}

#[test]
fn test_tampered_count_rejected_without_state_change() {
    let (state, _sink) = test_occupancy();
    let mut a1 = SensorNode::primary();
    state.ingest_bytes(&a1.next(5)).unwrap();
    let before = state.snapshot();

    // Re-sign nothing, just rewrite the count in flight.
    let mut envelope = a1.next_envelope(4);
    let data = envelope["data"].as_str().unwrap().replace("|4|", "|40|");
    envelope["data"] = json!(data);
    let bytes = serde_json::to_vec(&envelope).unwrap();

    let err = state.ingest_bytes(&bytes).unwrap_err();
    assert!(matches!(err, IngestError::SignatureMismatch { .. }));
    assert!(err.is_security_event());
    assert_eq!(state.snapshot(), before);
    assert_eq!(state.metrics().signature_mismatch, 1);
}

#[test]
fn test_source_spoofing_rejected() {
    let (state, _sink) = test_occupancy();

    // Valid A1 signature presented under the PMR1 identity.
    let mut impostor = SensorNode::new("PMR1", "CLE_A1_SECURE");
    let err = state.ingest_bytes(&impostor.next(9)).unwrap_err();
    assert!(matches!(err, IngestError::SignatureMismatch { .. }));

    let mut stranger = SensorNode::new("B7", "CLE_B7_SECURE");
    let err = state.ingest_bytes(&stranger.next(9)).unwrap_err();
    assert!(matches!(err, IngestError::UnknownSource { .. }));

    assert!(!state.snapshot().connected);
    assert_eq!(state.metrics().accepted, 0);
    assert_eq!(state.metrics().unknown_source, 1);
}

#[test]
fn test_malformed_inputs_dropped() {
    let (state, _sink) = test_occupancy();

    let cases: [&[u8]; 4] = [
        b"not json at all",
        br#"{"source":"A1"}"#,
        br#"{"source":"A1","data":""}"#,
        br#"{"source":"A1","data":"no-separator"}"#,
    ];
    for bytes in cases {
        assert!(state.ingest_bytes(bytes).is_err());
    }

    // Signed correctly but not four fields.
    let payload = "1|A1|12";
    let signature = compute_signature(b"CLE_A1_SECURE", payload).unwrap();
    let bytes = serde_json::to_vec(&json!({
        "source": "A1",
        "data": format!("{}:{}", payload, signature),
    }))
    .unwrap();
    let err = state.ingest_bytes(&bytes).unwrap_err();
    assert!(matches!(err, IngestError::MalformedPayload { .. }));

    let metrics = state.metrics();
    assert_eq!(metrics.accepted, 0);
    assert_eq!(metrics.rejected(), 5);
    assert_eq!(metrics.malformed_payload, 1);
    assert!(!state.snapshot().connected);
    assert_eq!(state.snapshot().total_free, Count::Unknown);
}

#[test]
fn test_message_loss_flagged_but_applied() {
    let (state, _sink) = test_occupancy();
    let mut a1 = SensorNode::primary();

    state.ingest_bytes(&a1.next(10)).unwrap();
    let expected = a1.last_signature.clone();
    a1.lose(9);

    let outcome = state.ingest_bytes(&a1.next(8)).unwrap();
    match outcome.chain {
        ChainStatus::Broken { expected: e, received } => {
            assert_eq!(e, expected);
            assert_ne!(received, expected);
        }
        ChainStatus::Linked => panic!("lost message should break the chain"),
    }
    assert_eq!(outcome.totals.total, 8);

    // The chain relinks on the next message.
    let outcome = state.ingest_bytes(&a1.next(7)).unwrap();
    assert_eq!(outcome.chain, ChainStatus::Linked);

    let a1_continuity = state
        .continuity()
        .into_iter()
        .find(|c| c.source == "A1")
        .unwrap();
    assert_eq!(a1_continuity.messages, 3);
    assert_eq!(a1_continuity.chain_breaks, 1);
    assert_eq!(a1_continuity.last_sequence, Some(4));
    assert_eq!(state.metrics().chain_breaks, 1);
}

#[test]
fn test_sources_chain_independently() {
    let (state, _sink) = test_occupancy();
    let mut a1 = SensorNode::primary();
    let mut pmr = SensorNode::reserved();

    for count in [4, 3, 2] {
        assert_eq!(state.ingest_bytes(&a1.next(count)).unwrap().chain, ChainStatus::Linked);
        assert_eq!(state.ingest_bytes(&pmr.next(1)).unwrap().chain, ChainStatus::Linked);
    }
    assert_eq!(state.metrics().chain_breaks, 0);
}

#[test]
fn test_capacity_alert_edge_triggered() {
    let (state, sink) = test_occupancy();
    let mut a1 = SensorNode::primary();
    let mut pmr = SensorNode::reserved();

    state.ingest_bytes(&pmr.next(0)).unwrap();
    assert_eq!(sink.alerts().len(), 1, "zero total on first report fires");

    state.ingest_bytes(&a1.next(0)).unwrap();
    state.ingest_bytes(&a1.next(0)).unwrap();
    assert_eq!(sink.alerts().len(), 1, "staying at zero stays quiet");

    state.ingest_bytes(&a1.next(1)).unwrap();
    let outcome = state.ingest_bytes(&a1.next(0)).unwrap();
    assert!(outcome.alert_raised);

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].reserved_free, 0);
    assert_eq!(alerts[1].title, "PARKING FULL");
}

#[test]
fn test_reserved_fallback_restores_primary() {
    let (state, _sink) = test_occupancy();
    let mut a1 = SensorNode::primary();
    let mut pmr = SensorNode::reserved();

    state.ingest_bytes(&a1.next(20)).unwrap();
    let outcome = state
        .ingest_bytes(&pmr.next_with_fallback(2, json!(17)))
        .unwrap();
    assert_eq!(outcome.totals.total, 19);

    // Numeric strings are accepted, junk is ignored.
    let outcome = state
        .ingest_bytes(&pmr.next_with_fallback(2, json!("15")))
        .unwrap();
    assert_eq!(outcome.totals.total, 17);
    let outcome = state
        .ingest_bytes(&pmr.next_with_fallback(2, json!("full")))
        .unwrap();
    assert_eq!(outcome.totals.total, 17);
}

#[test]
fn test_fallback_from_primary_source_ignored() {
    let (state, _sink) = test_occupancy();
    let mut a1 = SensorNode::primary();

    let outcome = state.ingest_bytes(&a1.next_with_fallback(6, json!(99))).unwrap();
    assert_eq!(outcome.totals.total, 6);
}

#[test]
fn test_override_then_sensor_resumes() {
    let (state, _sink) = test_occupancy();
    let mut a1 = SensorNode::primary();
    let mut pmr = SensorNode::reserved();
    state.ingest_bytes(&a1.next(10)).unwrap();
    state.ingest_bytes(&pmr.next(2)).unwrap();

    let applied = state
        .apply_override(&OverrideRequest::new(30, TEST_ADMIN_PASSWORD))
        .unwrap();
    assert_eq!(applied, 30);
    assert_eq!(state.snapshot().total_free, Count::Known(30));
    assert_eq!(state.snapshot().handicap_free, Count::Known(2));

    // Zone counts were untouched, so the next message recomputes from them.
    let outcome = state.ingest_bytes(&a1.next(9)).unwrap();
    assert_eq!(outcome.totals.total, 11);
    assert_eq!(state.snapshot().total_free, Count::Known(11));
}

#[test]
fn test_liveness_expiry() {
    let (state, _sink) = test_occupancy();
    let mut a1 = SensorNode::primary();
    let window = Duration::from_secs(30);

    assert!(!state.expire_if_stale(Instant::now() + window, window));

    state.ingest_bytes(&a1.next(5)).unwrap();
    assert!(!state.expire_if_stale(Instant::now(), window));
    assert!(state.expire_if_stale(Instant::now() + window, window));
    assert!(!state.snapshot().connected);
    assert_eq!(state.snapshot().total_free, Count::Known(5));

    state.ingest_bytes(&a1.next(4)).unwrap();
    assert!(state.snapshot().connected);
}

#[tokio::test]
async fn test_snapshot_subscribers_see_commits() {
    let (state, _sink) = test_occupancy();
    let mut rx = state.subscribe();
    let mut a1 = SensorNode::primary();

    state.ingest_bytes(&a1.next(3)).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().total_free, Count::Known(3));
}
