use std::fs;

use bidwatch_core::{
    detect, Baseline, ParamValue, ParameterSnapshot, UpdateSet,
};
use bidwatch_sync::{ConfigStore, ConfigTarget, KeyValueDocument, Line};
use rstest::rstest;
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn opaque_lines(doc: &KeyValueDocument) -> Vec<String> {
    doc.lines()
        .iter()
        .filter_map(|l| match l {
            Line::Opaque(raw) => Some(raw.clone()),
            _ => None,
        })
        .collect()
}

fn data_pairs_except(doc: &KeyValueDocument, skip: &UpdateSet) -> Vec<(String, String)> {
    doc.lines()
        .iter()
        .filter_map(|l| match l {
            Line::Data(e) if skip.get(e.key()).is_none() => {
                Some((e.key().to_string(), e.value().to_string()))
            }
            _ => None,
        })
        .collect()
}

#[rstest]
#[case("")]
#[case("BID_SMALL_AMOUNT=0.1")]
#[case("# header\n\nexport BID_SMALL_AMOUNT=0.1\nBID_LARGE_AMOUNT=0.5\n")]
#[case("RPC_URL=http://x?y=z\n# BID_LARGE_AMOUNT=7\n  garbage line\nBID_SMALL_AMOUNT_V2=3\n\n")]
#[case("export\tBIDDER_MAX_CONCURRENT_PROOFS=2\r\nZ=\r\n")]
#[case("# crlf\r\n\r\nexport BID_SMALL_AMOUNT=0.1\r\nKEEP=me\r\n")]
fn apply_then_reparse_keeps_requested_and_unrelated_content(#[case] source: &str) {
    init_logging();

    let mut updates = UpdateSet::new();
    updates.insert("BID_SMALL_AMOUNT", "0.25");
    updates.insert("BIDDER_MAX_CONCURRENT_PROOFS", "12");

    let original = KeyValueDocument::parse(source);
    let mut doc = KeyValueDocument::parse(&original.serialize());
    doc.apply(&updates);
    let reparsed = KeyValueDocument::parse(&doc.serialize());

    for (key, value) in updates.iter() {
        assert_eq!(reparsed.get(key.as_str()), Some(value), "key {key}");
    }
    assert_eq!(opaque_lines(&reparsed), opaque_lines(&original));
    assert_eq!(
        data_pairs_except(&reparsed, &updates),
        data_pairs_except(&original, &updates)
    );
}

#[test]
fn detected_updates_round_trip_through_the_store() {
    init_logging();

    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join(".env");
    fs::write(
        &path,
        "# bidder\nexport BID_SMALL_AMOUNT=0.05\nBIDDER_MAX_CONCURRENT_PROOFS=3\n",
    )
    .expect("seed");
    let store = ConfigStore::new(&path);

    let snapshot = ParameterSnapshot::new()
        .with("BID_SMALL_AMOUNT", ParamValue::Decimal(0.500000000001))
        .with("BID_LARGE_AMOUNT", ParamValue::Decimal(10.0))
        .with("BIDDER_MAX_CONCURRENT_PROOFS", ParamValue::Integer(3));
    let mut baseline = Baseline::new();

    let updates = detect::diff(&snapshot, &baseline);
    store.apply(&updates).expect("apply");
    store.confirm(&updates).expect("confirm");
    baseline.advance(&snapshot);

    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "# bidder\nexport BID_SMALL_AMOUNT=0.5\nBIDDER_MAX_CONCURRENT_PROOFS=3\nBID_LARGE_AMOUNT=10\n"
    );
    assert!(detect::diff(&snapshot, &baseline).is_empty());
}
