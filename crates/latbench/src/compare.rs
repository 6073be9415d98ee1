//! Comparator: per-metric deltas between two backends.
//!
//! Difference is `comparand - baseline`; percentage change is relative to
//! the baseline. A metric missing on either side yields an absent entry,
//! and a zero baseline yields a difference without a percentage.

use crate::backend::BackendId;
use crate::result::{BenchError, BenchResult};
use crate::stats::{Metric, Summary};
use serde::{Deserialize, Serialize};

/// Delta for one metric defined on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Baseline value
    pub baseline: f64,
    /// Comparand value
    pub comparand: f64,
    /// `comparand - baseline`
    pub difference: f64,
    /// `difference / baseline * 100`; `None` when the baseline is zero
    pub percent_change: Option<f64>,
}

impl MetricDelta {
    /// Compute the delta between two defined values
    #[must_use]
    pub fn between(baseline: f64, comparand: f64) -> Self {
        let difference = comparand - baseline;
        let percent_change = (baseline != 0.0).then(|| difference / baseline * 100.0);
        Self {
            baseline,
            comparand,
            difference,
            percent_change,
        }
    }
}

/// One row of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    /// Which metric
    pub metric: Metric,
    /// Delta, absent when either side lacks the metric
    pub delta: Option<MetricDelta>,
}

/// Deltas between a baseline and a comparand summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    baseline: BackendId,
    comparand: BackendId,
    entries: Vec<MetricComparison>,
}

impl Comparison {
    /// Baseline backend (reference for percentages)
    #[must_use]
    pub const fn baseline(&self) -> BackendId {
        self.baseline
    }

    /// Comparand backend
    #[must_use]
    pub const fn comparand(&self) -> BackendId {
        self.comparand
    }

    /// Rows, in [`Metric::ALL`] order
    #[must_use]
    pub fn entries(&self) -> &[MetricComparison] {
        &self.entries
    }

    /// Delta for one metric
    #[must_use]
    pub fn delta(&self, metric: Metric) -> Option<&MetricDelta> {
        self.entries
            .iter()
            .find(|e| e.metric == metric)
            .and_then(|e| e.delta.as_ref())
    }
}

/// Compare two summaries.
///
/// Fails with a configuration error when both describe the same backend.
pub fn compare(baseline: &Summary, comparand: &Summary) -> BenchResult<Comparison> {
    if baseline.backend() == comparand.backend() {
        return Err(BenchError::configuration(format!(
            "comparison needs two distinct backends, got {} twice",
            baseline.backend()
        )));
    }

    let entries = Metric::ALL
        .into_iter()
        .map(|metric| MetricComparison {
            metric,
            delta: baseline
                .metric(metric)
                .zip(comparand.metric(metric))
                .map(|(b, c)| MetricDelta::between(b, c)),
        })
        .collect();

    Ok(Comparison {
        baseline: baseline.backend(),
        comparand: comparand.backend(),
        entries,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::caller::Trial;

    fn summary(backend: BackendId, durations: &[f64], failures: usize) -> Summary {
        let mut trials: Vec<Trial> = durations
            .iter()
            .map(|&d| Trial::success(backend, d))
            .collect();
        trials.extend((0..failures).map(|_| Trial::failure(backend, 0.0, "down")));
        Summary::from_trials(backend, &trials).unwrap()
    }

    #[test]
    fn test_delta_between() {
        let delta = MetricDelta::between(2.0, 3.0);
        assert_eq!(delta.difference, 1.0);
        assert_eq!(delta.percent_change, Some(50.0));
    }

    #[test]
    fn test_delta_zero_baseline_has_no_percentage() {
        let delta = MetricDelta::between(0.0, 3.0);
        assert_eq!(delta.difference, 3.0);
        assert_eq!(delta.percent_change, None);
    }

    #[test]
    fn test_compare_equal_averages() {
        let a = summary(BackendId::Anthropic, &[1.0, 2.0, 3.0], 0);
        let b = summary(BackendId::Bedrock, &[2.0, 2.0, 2.0], 0);
        let cmp = compare(&a, &b).unwrap();
        let avg = cmp.delta(Metric::Average).unwrap();
        assert_eq!(avg.difference, 0.0);
        assert_eq!(avg.percent_change, Some(0.0));
        assert_eq!(cmp.delta(Metric::Minimum).unwrap().difference, 1.0);
        assert_eq!(cmp.delta(Metric::Maximum).unwrap().difference, -1.0);
        assert_eq!(cmp.entries().len(), Metric::ALL.len());
    }

    #[test]
    fn test_compare_same_backend_rejected() {
        let a = summary(BackendId::Bedrock, &[1.0], 0);
        let b = summary(BackendId::Bedrock, &[2.0], 0);
        let err = compare(&a, &b).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_compare_against_no_successes() {
        let a = summary(BackendId::Anthropic, &[], 2);
        let b = summary(BackendId::Bedrock, &[1.0, 2.0], 0);
        let cmp = compare(&a, &b).unwrap();
        for metric in Metric::ALL.into_iter().filter(|m| m.is_latency()) {
            assert!(cmp.delta(metric).is_none(), "{metric} should be absent");
        }
        // Counts are always defined; failure baseline 2 -> comparand 0.
        let failures = cmp.delta(Metric::FailureCount).unwrap();
        assert_eq!(failures.difference, -2.0);
        assert_eq!(failures.percent_change, Some(-100.0));
        // Zero successes on the baseline: difference only.
        let successes = cmp.delta(Metric::SuccessCount).unwrap();
        assert_eq!(successes.percent_change, None);
    }

    #[test]
    fn test_comparison_accessors() {
        let a = summary(BackendId::Anthropic, &[1.0], 0);
        let b = summary(BackendId::Bedrock, &[1.5], 0);
        let cmp = compare(&a, &b).unwrap();
        assert_eq!(cmp.baseline(), BackendId::Anthropic);
        assert_eq!(cmp.comparand(), BackendId::Bedrock);
    }
}
