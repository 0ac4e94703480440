//! Endpoint JSON in, update set out: decoding plus change detection.

use bidwatch_core::{detect, Baseline, ParameterSnapshot, RemotePayload};
use rstest::rstest;

fn snapshot(json: &str) -> ParameterSnapshot {
    let payload: RemotePayload = serde_json::from_str(json).expect("decode payload");
    ParameterSnapshot::from(payload)
}

fn rendered(json: &str, baseline: &Baseline) -> String {
    detect::diff(&snapshot(json), baseline).to_string()
}

// ---------------------------------------------------------------------------
// First poll: everything present is an update
// ---------------------------------------------------------------------------

#[rstest]
#[case::empty_object("{}", "")]
#[case::small_only(r#"{"small_bid":0.1}"#, "BID_SMALL_AMOUNT=0.1")]
#[case::integer_decimal(r#"{"large_bid":10}"#, "BID_LARGE_AMOUNT=10")]
#[case::noise_trimmed(r#"{"large_bid":0.500000000001}"#, "BID_LARGE_AMOUNT=0.5")]
#[case::all_fields(
    r#"{"small_bid":0.1,"large_bid":0.75,"max_concurrency":4}"#,
    "BIDDER_MAX_CONCURRENT_PROOFS=4, BID_LARGE_AMOUNT=0.75, BID_SMALL_AMOUNT=0.1"
)]
#[case::unknown_fields_ignored(r#"{"small_bid":0.2,"region":"eu"}"#, "BID_SMALL_AMOUNT=0.2")]
#[case::explicit_null(r#"{"small_bid":null,"max_concurrency":2}"#, "BIDDER_MAX_CONCURRENT_PROOFS=2")]
fn first_poll_reports_every_present_field(#[case] json: &str, #[case] expected: &str) {
    assert_eq!(rendered(json, &Baseline::new()), expected);
}

// ---------------------------------------------------------------------------
// Later polls
// ---------------------------------------------------------------------------

#[test]
fn repeated_poll_after_advance_is_a_no_op() {
    let json = r#"{"small_bid":0.1,"large_bid":0.75,"max_concurrency":4}"#;
    let mut baseline = Baseline::new();
    baseline.advance(&snapshot(json));

    assert!(detect::diff(&snapshot(json), &baseline).is_empty());
}

#[test]
fn dropping_a_field_does_not_forget_it() {
    let mut baseline = Baseline::new();
    baseline.advance(&snapshot(r#"{"small_bid":0.1,"max_concurrency":4}"#));
    baseline.advance(&snapshot(r#"{"small_bid":0.1}"#));

    assert!(detect::diff(&snapshot(r#"{"max_concurrency":4}"#), &baseline).is_empty());
    assert_eq!(
        rendered(r#"{"max_concurrency":5}"#, &baseline),
        "BIDDER_MAX_CONCURRENT_PROOFS=5"
    );
}

#[test]
fn fractional_concurrency_is_rejected() {
    let result: Result<RemotePayload, _> = serde_json::from_str(r#"{"max_concurrency":2.5}"#);
    assert!(result.is_err());
}
