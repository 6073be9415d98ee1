//! Statistics Aggregator: trials in, [`Summary`] out.
//!
//! Latency metrics are computed over successful trials only. With no
//! successes they are absent (`None`), never zero or NaN, so nothing
//! downstream can fold a made-up number into a comparison.
//!
//! ## Percentile convention
//!
//! Linear interpolation between closest ranks (Hyndman & Fan type 7, the
//! NumPy default). For sorted samples `s` of length `n`:
//!
//! ```text
//! rank = p * (n - 1)
//! p95  = s[floor(rank)] + (s[ceil(rank)] - s[floor(rank)]) * (rank - floor(rank))
//! ```

use crate::backend::BackendId;
use crate::caller::Trial;
use crate::result::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentile reported as `p95`.
pub const P95_QUANTILE: f64 = 0.95;

/// Metrics reported per backend, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Arithmetic mean latency
    Average,
    /// Fastest successful call
    Minimum,
    /// Slowest successful call
    Maximum,
    /// Median latency
    Median,
    /// 95th percentile latency
    P95,
    /// Successful requests
    SuccessCount,
    /// Failed requests
    FailureCount,
}

impl Metric {
    /// Every metric, in report order
    pub const ALL: [Self; 7] = [
        Self::Average,
        Self::Minimum,
        Self::Maximum,
        Self::Median,
        Self::P95,
        Self::SuccessCount,
        Self::FailureCount,
    ];

    /// Whether this is a latency metric (seconds) rather than a count
    #[must_use]
    pub const fn is_latency(self) -> bool {
        !matches!(self, Self::SuccessCount | Self::FailureCount)
    }

    /// Report row label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Average => "Average Latency (ms)",
            Self::Minimum => "Minimum Latency (ms)",
            Self::Maximum => "Maximum Latency (ms)",
            Self::Median => "Median Latency (ms)",
            Self::P95 => "P95 Latency (ms)",
            Self::SuccessCount => "Successful Requests",
            Self::FailureCount => "Failed Requests",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Latency metrics over successful trials, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Arithmetic mean
    pub average: f64,
    /// Minimum
    pub minimum: f64,
    /// Maximum
    pub maximum: f64,
    /// Median (mean of the middle pair for even counts)
    pub median: f64,
    /// 95th percentile, linear interpolation
    pub p95: f64,
}

impl LatencyStats {
    /// Compute from success durations. Non-finite samples are ignored;
    /// `None` when nothing is left.
    #[must_use]
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = durations.iter().copied().filter(|d| d.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let minimum = sorted[0];
        let maximum = sorted[sorted.len() - 1];
        let sum: f64 = sorted.iter().sum();
        // Summation rounding can land a ulp outside the sample range.
        let average = (sum / sorted.len() as f64).clamp(minimum, maximum);

        Some(Self {
            average,
            minimum,
            maximum,
            median: median(&sorted),
            p95: interpolate(&sorted, P95_QUANTILE),
        })
    }
}

/// Median of a sorted, non-empty slice.
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        let (lo, hi) = (sorted[mid - 1], sorted[mid]);
        (lo + (hi - lo) / 2.0).clamp(lo, hi)
    }
}

/// Linear-interpolation percentile of a sorted, finite slice, `p` in `[0, 1]`.
/// Returns `None` for an empty slice.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        None
    } else {
        Some(interpolate(sorted, p))
    }
}

fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (rank.ceil() as usize).min(sorted.len() - 1);
    let frac = rank - lo as f64;
    (sorted[lo] + (sorted[hi] - sorted[lo]) * frac).clamp(sorted[lo], sorted[hi])
}

/// Aggregated results for one backend.
///
/// Deserialization re-checks the counts, so a hand-edited report cannot
/// carry latency without successes or a tally that does not add up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SummaryRecord")]
pub struct Summary {
    backend: BackendId,
    trial_count: usize,
    success_count: usize,
    failure_count: usize,
    latency: Option<LatencyStats>,
}

/// Unchecked wire form of [`Summary`].
#[derive(Deserialize)]
struct SummaryRecord {
    backend: BackendId,
    trial_count: usize,
    success_count: usize,
    failure_count: usize,
    latency: Option<LatencyStats>,
}

impl TryFrom<SummaryRecord> for Summary {
    type Error = String;

    fn try_from(record: SummaryRecord) -> Result<Self, Self::Error> {
        if record.success_count.checked_add(record.failure_count) != Some(record.trial_count) {
            return Err(format!(
                "{} summary: {} ok + {} failed != {} trials",
                record.backend, record.success_count, record.failure_count, record.trial_count
            ));
        }
        if record.latency.is_some() != (record.success_count > 0) {
            return Err(format!(
                "{} summary: latency must be present exactly when there are successes",
                record.backend
            ));
        }
        Ok(Self {
            backend: record.backend,
            trial_count: record.trial_count,
            success_count: record.success_count,
            failure_count: record.failure_count,
            latency: record.latency,
        })
    }
}

impl Summary {
    /// Aggregate the trials of one backend.
    ///
    /// Fails if any trial was recorded against a different backend.
    pub fn from_trials(backend: BackendId, trials: &[Trial]) -> BenchResult<Self> {
        if let Some(stray) = trials.iter().find(|t| t.backend() != backend) {
            return Err(BenchError::configuration(format!(
                "cannot aggregate {} trial into {backend} summary",
                stray.backend()
            )));
        }

        let durations: Vec<f64> = trials
            .iter()
            .filter(|t| t.is_success())
            .map(Trial::elapsed_secs)
            .collect();
        let success_count = durations.len();

        Ok(Self {
            backend,
            trial_count: trials.len(),
            success_count,
            failure_count: trials.len() - success_count,
            latency: LatencyStats::from_durations(&durations),
        })
    }

    /// Backend these numbers describe
    #[must_use]
    pub const fn backend(&self) -> BackendId {
        self.backend
    }

    /// Trials attempted
    #[must_use]
    pub const fn trial_count(&self) -> usize {
        self.trial_count
    }

    /// Successful trials
    #[must_use]
    pub const fn success_count(&self) -> usize {
        self.success_count
    }

    /// Failed trials
    #[must_use]
    pub const fn failure_count(&self) -> usize {
        self.failure_count
    }

    /// Latency metrics; `None` when nothing succeeded
    #[must_use]
    pub const fn latency(&self) -> Option<&LatencyStats> {
        self.latency.as_ref()
    }

    /// Value of one metric. Latency in seconds; counts always present.
    #[must_use]
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SuccessCount => Some(self.success_count as f64),
            Metric::FailureCount => Some(self.failure_count as f64),
            Metric::Average => self.latency.map(|l| l.average),
            Metric::Minimum => self.latency.map(|l| l.minimum),
            Metric::Maximum => self.latency.map(|l| l.maximum),
            Metric::Median => self.latency.map(|l| l.median),
            Metric::P95 => self.latency.map(|l| l.p95),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn ok(secs: f64) -> Trial {
        Trial::success(BackendId::Bedrock, secs)
    }

    fn failed() -> Trial {
        Trial::failure(BackendId::Bedrock, 0.1, "boom")
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 0.95), None);
    }

    #[test]
    fn test_percentile_single() {
        assert_eq!(percentile(&[42.0], 0.95), Some(42.0));
        assert_eq!(percentile(&[42.0], 0.0), Some(42.0));
    }

    #[test]
    fn test_percentile_interpolates() {
        let data: Vec<f64> = (1..=100).map(f64::from).collect();
        // rank = 0.95 * 99 = 94.05 -> 95 + 0.05 * (96 - 95)
        assert!((percentile(&data, 0.95).unwrap() - 95.05).abs() < 1e-9);
        assert_eq!(percentile(&data, 0.5), Some(50.5));
    }

    #[test]
    fn test_percentile_boundary() {
        let data = vec![1.0, 2.0, 3.0];
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 1.0), Some(3.0));
        // rank = 1.9 -> 2 + 0.9
        assert!((percentile(&data, 0.95).unwrap() - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 10.0]), 2.5);
    }

    #[test]
    fn test_non_finite_samples_ignored() {
        let stats = LatencyStats::from_durations(&[f64::NAN, 2.0, f64::INFINITY]).unwrap();
        assert_eq!(stats.minimum, 2.0);
        assert_eq!(stats.maximum, 2.0);
        assert!(LatencyStats::from_durations(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_summary_all_success() {
        let summary = Summary::from_trials(BackendId::Bedrock, &[ok(3.0), ok(1.0), ok(2.0)]).unwrap();
        let latency = summary.latency().unwrap();
        assert_eq!(summary.trial_count(), 3);
        assert_eq!(summary.success_count(), 3);
        assert_eq!(summary.failure_count(), 0);
        assert_eq!(latency.average, 2.0);
        assert_eq!(latency.minimum, 1.0);
        assert_eq!(latency.maximum, 3.0);
        assert_eq!(latency.median, 2.0);
    }

    #[test]
    fn test_summary_ignores_failure_durations() {
        let trials = vec![ok(1.0), Trial::failure(BackendId::Bedrock, 99.0, "slow")];
        let summary = Summary::from_trials(BackendId::Bedrock, &trials).unwrap();
        assert_eq!(summary.latency().unwrap().maximum, 1.0);
        assert_eq!(summary.failure_count(), 1);
    }

    #[test]
    fn test_summary_no_successes() {
        let summary = Summary::from_trials(BackendId::Bedrock, &[failed(), failed()]).unwrap();
        assert_eq!(summary.success_count(), 0);
        assert_eq!(summary.failure_count(), 2);
        assert!(summary.latency().is_none());
        for metric in Metric::ALL.into_iter().filter(|m| m.is_latency()) {
            assert_eq!(summary.metric(metric), None);
        }
        assert_eq!(summary.metric(Metric::FailureCount), Some(2.0));
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_trials(BackendId::Anthropic, &[]).unwrap();
        assert_eq!(summary.trial_count(), 0);
        assert!(summary.latency().is_none());
    }

    #[test]
    fn test_summary_rejects_foreign_trials() {
        let trials = vec![ok(1.0), Trial::success(BackendId::Anthropic, 1.0)];
        let err = Summary::from_trials(BackendId::Bedrock, &trials).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_metric_labels_and_order() {
        assert_eq!(Metric::ALL[0], Metric::Average);
        assert_eq!(Metric::P95.label(), "P95 Latency (ms)");
        assert!(!Metric::SuccessCount.is_latency());
        assert!(Metric::Median.is_latency());
    }

    #[test]
    fn test_summary_serialization_keeps_absent_latency() {
        let summary = Summary::from_trials(BackendId::Bedrock, &[failed()]).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["latency"].is_null());
        let back: Summary = serde_json::from_value(json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_summary_deserialize_rejects_bad_tally() {
        let summary = Summary::from_trials(BackendId::Bedrock, &[ok(1.0), failed()]).unwrap();
        let mut json = serde_json::to_value(&summary).unwrap();
        json["failure_count"] = serde_json::json!(5);
        let err = serde_json::from_value::<Summary>(json).unwrap_err();
        assert!(err.to_string().contains("!= 2 trials"));
    }

    #[test]
    fn test_summary_deserialize_rejects_latency_without_successes() {
        let with_latency = Summary::from_trials(BackendId::Bedrock, &[ok(1.0)]).unwrap();
        let mut json = serde_json::to_value(&with_latency).unwrap();
        json["success_count"] = serde_json::json!(0);
        json["failure_count"] = serde_json::json!(1);
        assert!(serde_json::from_value::<Summary>(json).is_err());

        let without_latency = Summary::from_trials(BackendId::Bedrock, &[failed()]).unwrap();
        let mut json = serde_json::to_value(&without_latency).unwrap();
        json["success_count"] = serde_json::json!(1);
        json["failure_count"] = serde_json::json!(0);
        assert!(serde_json::from_value::<Summary>(json).is_err());
    }
}
