//! Change detection between a fresh snapshot and the applied baseline.

use crate::types::{Baseline, ParameterSnapshot, UpdateSet};

/// Digits kept after the decimal point before trailing zeros are trimmed.
pub const DECIMAL_PRECISION: usize = 6;

/// Compute the keys that must be written for `snapshot` given `baseline`.
///
/// A present parameter is included when the baseline is uninitialized, has
/// no entry for it, or holds a different value. Comparison is exact.
/// Absent parameters never appear in the result.
pub fn diff(snapshot: &ParameterSnapshot, baseline: &Baseline) -> UpdateSet {
    let mut updates = UpdateSet::new();
    for (key, value) in snapshot.iter() {
        let changed = !baseline.is_initialized()
            || match baseline.get(key) {
                Some(applied) => applied != *value,
                None => true,
            };
        if changed {
            updates.insert(key.clone(), value.canonical());
        }
    }
    updates
}

/// Render a decimal at fixed precision, then drop trailing fractional zeros
/// and a dangling decimal point: `0.500000` becomes `0.5`, `10.000000`
/// becomes `10`.
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{value:.prec$}", prec = DECIMAL_PRECISION);
    if !fixed.contains('.') {
        return fixed;
    }
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::types::{
        ParamKey, ParamValue, BIDDER_MAX_CONCURRENT_PROOFS, BID_LARGE_AMOUNT, BID_SMALL_AMOUNT,
    };

    fn full_snapshot() -> ParameterSnapshot {
        ParameterSnapshot::new()
            .with(BID_SMALL_AMOUNT, ParamValue::Decimal(0.1))
            .with(BID_LARGE_AMOUNT, ParamValue::Decimal(0.5))
            .with(BIDDER_MAX_CONCURRENT_PROOFS, ParamValue::Integer(10))
    }

    #[rstest]
    #[case(0.500000000001, "0.5")]
    #[case(10.0, "10")]
    #[case(0.1, "0.1")]
    #[case(0.0, "0")]
    #[case(100.0, "100")]
    #[case(1.2345678, "1.234568")]
    #[case(-2.50, "-2.5")]
    fn decimal_formatting(#[case] input: f64, #[case] expected: &str) {
        assert_eq!(format_decimal(input), expected);
    }

    #[test]
    fn integers_render_plain() {
        assert_eq!(ParamValue::Integer(10).canonical(), "10");
        assert_eq!(ParamValue::Integer(-3).canonical(), "-3");
    }

    #[test]
    fn uninitialized_baseline_yields_every_present_parameter() {
        let updates = diff(&full_snapshot(), &Baseline::new());
        assert_eq!(updates.len(), 3);
        assert_eq!(updates.get(BID_SMALL_AMOUNT), Some("0.1"));
        assert_eq!(updates.get(BID_LARGE_AMOUNT), Some("0.5"));
        assert_eq!(updates.get(BIDDER_MAX_CONCURRENT_PROOFS), Some("10"));
    }

    #[test]
    fn matching_baseline_yields_empty_update_set() {
        let snapshot = full_snapshot();
        let mut baseline = Baseline::new();
        baseline.advance(&snapshot);

        assert!(diff(&snapshot, &baseline).is_empty());

        // Any subset of an applied snapshot is also a no-op.
        let partial = ParameterSnapshot::new().with(BID_LARGE_AMOUNT, ParamValue::Decimal(0.5));
        assert!(diff(&partial, &baseline).is_empty());
        assert!(diff(&ParameterSnapshot::new(), &baseline).is_empty());
    }

    #[test]
    fn only_changed_parameters_are_reported() {
        let mut baseline = Baseline::new();
        baseline.advance(&full_snapshot());

        let next = ParameterSnapshot::new()
            .with(BID_SMALL_AMOUNT, ParamValue::Decimal(0.1))
            .with(BID_LARGE_AMOUNT, ParamValue::Decimal(0.75))
            .with(BIDDER_MAX_CONCURRENT_PROOFS, ParamValue::Integer(10));
        let updates = diff(&next, &baseline);

        assert_eq!(updates.keys(), vec![ParamKey::from(BID_LARGE_AMOUNT)]);
        assert_eq!(updates.get(BID_LARGE_AMOUNT), Some("0.75"));
    }

    #[test]
    fn parameter_never_recorded_is_reported_even_when_initialized() {
        let mut baseline = Baseline::new();
        baseline.advance(&ParameterSnapshot::new().with(BID_SMALL_AMOUNT, ParamValue::Decimal(0.1)));

        let next = ParameterSnapshot::new()
            .with(BID_SMALL_AMOUNT, ParamValue::Decimal(0.1))
            .with(BIDDER_MAX_CONCURRENT_PROOFS, ParamValue::Integer(4));
        let updates = diff(&next, &baseline);

        assert_eq!(
            updates.keys(),
            vec![ParamKey::from(BIDDER_MAX_CONCURRENT_PROOFS)]
        );
    }

    #[test]
    fn sub_precision_change_is_still_detected() {
        let mut baseline = Baseline::new();
        baseline.advance(&ParameterSnapshot::new().with(BID_SMALL_AMOUNT, ParamValue::Decimal(0.1)));

        let next =
            ParameterSnapshot::new().with(BID_SMALL_AMOUNT, ParamValue::Decimal(0.100000001));
        let updates = diff(&next, &baseline);

        // Exact comparison flags it; canonical text is unchanged.
        assert_eq!(updates.get(BID_SMALL_AMOUNT), Some("0.1"));
    }

    #[test]
    fn small_bid_scenario_settles_after_one_apply() {
        let snapshot = ParameterSnapshot::new().with(BID_SMALL_AMOUNT, ParamValue::Decimal(0.1));
        let mut baseline = Baseline::new();

        let first = diff(&snapshot, &baseline);
        assert_eq!(first.len(), 1);
        assert_eq!(first.get(BID_SMALL_AMOUNT), Some("0.1"));

        baseline.advance(&snapshot);
        assert_eq!(
            baseline.get(&ParamKey::from(BID_SMALL_AMOUNT)),
            Some(ParamValue::Decimal(0.1))
        );
        assert!(diff(&snapshot, &baseline).is_empty());
    }
}
