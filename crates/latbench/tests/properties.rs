//! Property-based tests for aggregation and comparison.
//!
//! Uses proptest to check invariants over arbitrary trial sequences.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use latbench::prelude::*;
use latbench::LatencyStats;
use proptest::prelude::*;

fn trials_strategy(backend: BackendId) -> impl Strategy<Value = Vec<Trial>> {
    prop::collection::vec((0.0f64..120.0, any::<bool>()), 0..40).prop_map(move |raw| {
        raw.into_iter()
            .map(|(secs, ok)| {
                if ok {
                    Trial::success(backend, secs)
                } else {
                    Trial::failure(backend, secs, "scripted failure")
                }
            })
            .collect()
    })
}

// === Summary invariants ===

proptest! {
    /// Ordering of the location metrics.
    #[test]
    fn prop_min_median_average_max_ordered(
        durations in prop::collection::vec(0.0f64..1.0e4, 1..60)
    ) {
        let stats = LatencyStats::from_durations(&durations).unwrap();
        prop_assert!(stats.minimum <= stats.median);
        prop_assert!(stats.median <= stats.maximum);
        prop_assert!(stats.minimum <= stats.average);
        prop_assert!(stats.average <= stats.maximum);
        prop_assert!(stats.minimum <= stats.p95 && stats.p95 <= stats.maximum);
    }

    /// Counts always add up.
    #[test]
    fn prop_counts_add_up(trials in trials_strategy(BackendId::Bedrock)) {
        let summary = Summary::from_trials(BackendId::Bedrock, &trials).unwrap();
        prop_assert_eq!(summary.success_count() + summary.failure_count(), summary.trial_count());
        prop_assert_eq!(summary.trial_count(), trials.len());
        prop_assert_eq!(summary.latency().is_none(), summary.success_count() == 0);
    }

    /// Aggregation is a pure function of its input.
    #[test]
    fn prop_aggregation_deterministic(trials in trials_strategy(BackendId::Anthropic)) {
        let first = Summary::from_trials(BackendId::Anthropic, &trials).unwrap();
        let second = Summary::from_trials(BackendId::Anthropic, &trials).unwrap();
        match (first.latency(), second.latency()) {
            (Some(a), Some(b)) => {
                prop_assert_eq!(a.p95.to_bits(), b.p95.to_bits());
                prop_assert_eq!(a.median.to_bits(), b.median.to_bits());
                prop_assert_eq!(a.average.to_bits(), b.average.to_bits());
            }
            (None, None) => {}
            _ => prop_assert!(false, "latency presence differs between runs"),
        }
    }

    /// Input order does not change the percentile.
    #[test]
    fn prop_percentile_order_independent(
        mut durations in prop::collection::vec(0.0f64..1.0e3, 1..30)
    ) {
        let forward = LatencyStats::from_durations(&durations).unwrap();
        durations.reverse();
        let backward = LatencyStats::from_durations(&durations).unwrap();
        prop_assert_eq!(forward.p95.to_bits(), backward.p95.to_bits());
        prop_assert_eq!(forward.median.to_bits(), backward.median.to_bits());
    }
}

// === Comparison invariants ===

proptest! {
    /// Swapping baseline and comparand negates every difference exactly;
    /// percentages follow their defining formula on each side.
    #[test]
    fn prop_comparator_antisymmetric(
        a in trials_strategy(BackendId::Anthropic),
        b in trials_strategy(BackendId::Bedrock),
    ) {
        let sa = Summary::from_trials(BackendId::Anthropic, &a).unwrap();
        let sb = Summary::from_trials(BackendId::Bedrock, &b).unwrap();
        let forward = compare(&sa, &sb).unwrap();
        let backward = compare(&sb, &sa).unwrap();

        for metric in Metric::ALL {
            match (forward.delta(metric), backward.delta(metric)) {
                (Some(f), Some(r)) => {
                    prop_assert_eq!(f.difference, -r.difference);
                    match f.percent_change {
                        Some(p) => {
                            prop_assert!(f.baseline != 0.0);
                            prop_assert_eq!(p, f.difference / f.baseline * 100.0);
                        }
                        None => prop_assert_eq!(f.baseline, 0.0),
                    }
                    match r.percent_change {
                        Some(p) => prop_assert_eq!(p, r.difference / r.baseline * 100.0),
                        None => prop_assert_eq!(r.baseline, 0.0),
                    }
                }
                (None, None) => prop_assert!(metric.is_latency()),
                _ => prop_assert!(false, "presence of {} differs when swapped", metric),
            }
        }
    }

    /// A side without successes yields absent latency deltas and never errors.
    #[test]
    fn prop_no_successes_means_absent_deltas(
        failures in 0usize..10,
        other in trials_strategy(BackendId::Bedrock),
    ) {
        let failed: Vec<Trial> = (0..failures)
            .map(|_| Trial::failure(BackendId::Anthropic, 0.5, "down"))
            .collect();
        let empty = Summary::from_trials(BackendId::Anthropic, &failed).unwrap();
        let sb = Summary::from_trials(BackendId::Bedrock, &other).unwrap();

        for cmp in [compare(&empty, &sb).unwrap(), compare(&sb, &empty).unwrap()] {
            for metric in Metric::ALL.into_iter().filter(|m| m.is_latency()) {
                prop_assert!(cmp.delta(metric).is_none());
            }
        }
    }
}
