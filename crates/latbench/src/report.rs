//! Report generation for benchmark runs.
//!
//! Produces JSON and Markdown artifacts named after the run's start time
//! and short run id, and maintains a historical Markdown table across runs.

use crate::backend::BackendId;
use crate::benchmark::RunReport;
use crate::compare::Comparison;
use crate::result::BenchResult;
use crate::stats::{Metric, Summary};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// File name prefix for persisted reports.
pub const REPORT_PREFIX: &str = "benchmark_results_";

/// Placeholder for absent values.
const ABSENT: &str = "n/a";

/// Serialize a run report to a pretty-printed JSON string.
pub fn to_json(report: &RunReport) -> BenchResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Timestamped file stem, e.g. `benchmark_results_20260301_040000_1a2b3c4d`.
///
/// The trailing short run id keeps runs started in the same second apart.
pub fn file_stem(report: &RunReport) -> String {
    format!(
        "{REPORT_PREFIX}{}_{}",
        report.started_at.format("%Y%m%d_%H%M%S"),
        report.short_id()
    )
}

/// Render a metric value: latency in ms, counts as integers.
fn format_value(metric: Metric, value: Option<f64>) -> String {
    match value {
        None => ABSENT.to_string(),
        Some(v) if metric.is_latency() => format!("{:.2}", v * 1000.0),
        Some(v) => format!("{v:.0}"),
    }
}

fn format_difference(metric: Metric, difference: f64) -> String {
    if metric.is_latency() {
        format!("{:+.2}", difference * 1000.0)
    } else {
        format!("{difference:+.0}")
    }
}

fn format_percent(percent: Option<f64>) -> String {
    percent.map_or_else(|| ABSENT.to_string(), |p| format!("{p:+.2}%"))
}

/// Markdown table comparing two backends.
///
/// Columns follow the comparand-first layout: comparand value, baseline
/// value, difference, percentage change.
pub fn comparison_table(
    comparison: &Comparison,
    baseline: &Summary,
    comparand: &Summary,
) -> String {
    let mut out = format!(
        "| Metric | {} | {} | Difference | Percentage Change |\n|---|---|---|---|---|\n",
        comparison.comparand().label(),
        comparison.baseline().label(),
    );
    for entry in comparison.entries() {
        let metric = entry.metric;
        let (difference, percent) = entry.delta.map_or_else(
            || (ABSENT.to_string(), ABSENT.to_string()),
            |d| {
                (
                    format_difference(metric, d.difference),
                    format_percent(d.percent_change),
                )
            },
        );
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            metric.label(),
            format_value(metric, comparand.metric(metric)),
            format_value(metric, baseline.metric(metric)),
            difference,
            percent,
        );
    }
    out
}

/// Markdown table for a single backend.
pub fn summary_table(summary: &Summary) -> String {
    let mut out = format!(
        "| Metric | {} |\n|---|---|\n",
        summary.backend().label()
    );
    for metric in Metric::ALL {
        let _ = writeln!(
            out,
            "| {} | {} |",
            metric.label(),
            format_value(metric, summary.metric(metric))
        );
    }
    out
}

/// Full Markdown report for a run.
pub fn to_markdown(report: &RunReport) -> String {
    let mut out = String::from("# Benchmark Results\n\n");

    let paired = report.comparison.as_ref().and_then(|cmp| {
        Some((
            cmp,
            report.summary(cmp.baseline())?,
            report.summary(cmp.comparand())?,
        ))
    });

    if let Some((cmp, baseline, comparand)) = paired {
        out.push_str(&comparison_table(cmp, baseline, comparand));
    } else {
        for summary in report.summaries.values() {
            out.push_str(&summary_table(summary));
            out.push('\n');
        }
    }

    out.push_str("\n## Test Information\n\n");
    let _ = writeln!(out, "- Run ID: {}", report.run_id);
    let _ = writeln!(out, "- Timestamp: {}", report.started_at.to_rfc3339());
    let _ = writeln!(out, "- Trials per backend: {}", report.trials_per_backend);
    for (backend, summary) in &report.summaries {
        let model = report.models.get(backend).map_or(ABSENT, String::as_str);
        let _ = writeln!(
            out,
            "- {} ({model}): {} requests",
            backend.label(),
            summary.trial_count()
        );
    }
    let _ = writeln!(out, "- Total requests: {}", report.total_requests());
    out
}

/// Write `<stem>.json` and `<stem>.md` into `dir`, creating it if needed.
///
/// Existing files are never overwritten.
pub fn write_report(dir: &Path, report: &RunReport) -> BenchResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let stem = file_stem(report);

    let json_path = dir.join(format!("{stem}.json"));
    write_new(&json_path, &to_json(report)?)?;

    let md_path = dir.join(format!("{stem}.md"));
    write_new(&md_path, &to_markdown(report))?;

    tracing::info!(path = %json_path.display(), "report written");
    Ok(vec![json_path, md_path])
}

fn write_new(path: &Path, contents: &str) -> BenchResult<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// Load every saved JSON report in `dir`, oldest first.
///
/// Files that cannot be read or parsed are skipped with a warning.
pub fn load_reports(dir: &Path) -> BenchResult<Vec<RunReport>> {
    let mut reports = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_report = path.extension().and_then(|e| e.to_str()) == Some("json")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(REPORT_PREFIX));
        if !is_report {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable report");
                continue;
            }
        };
        match serde_json::from_str::<RunReport>(&content) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping report"),
        }
    }
    reports.sort_by(|a, b| a.started_at.cmp(&b.started_at));
    Ok(reports)
}

/// Header for the history Markdown table.
const HISTORY_HEADER: &str = "\
| Date | Run | Backend | Model | Trials | OK | Failed | Avg (ms) | P50 (ms) | P95 (ms) |
|------|-----|---------|-------|--------|----|--------|----------|----------|----------|";

/// History rows for one run, one per backend.
pub fn history_rows(report: &RunReport) -> Vec<String> {
    let date = report.started_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let run = report.short_id();
    report
        .summaries
        .iter()
        .map(|(backend, s)| {
            history_row(
                &date,
                &run,
                *backend,
                report.models.get(backend).map_or(ABSENT, String::as_str),
                s,
            )
        })
        .collect()
}

fn history_row(date: &str, run: &str, backend: BackendId, model: &str, s: &Summary) -> String {
    format!(
        "| {date} | {run} | {} | {model} | {} | {} | {} | {} | {} | {} |",
        backend.label(),
        s.trial_count(),
        s.success_count(),
        s.failure_count(),
        format_value(Metric::Average, s.metric(Metric::Average)),
        format_value(Metric::Median, s.metric(Metric::Median)),
        format_value(Metric::P95, s.metric(Metric::P95)),
    )
}

/// Run id column of a history table row.
fn history_run_id(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix('|')?
        .split('|')
        .nth(1)
        .map(str::trim)
}

/// Append runs to a Markdown history file and return how many were added.
///
/// Creates the file with a header when missing; appends rows under an
/// existing table; adds a new table section to a file without one.
/// Runs whose id already has rows in the file are skipped.
pub fn append_history(path: &Path, reports: &[RunReport]) -> BenchResult<usize> {
    let existing = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut seen: HashSet<String> = existing
        .lines()
        .filter_map(history_run_id)
        .map(str::to_string)
        .collect();
    let fresh: Vec<&RunReport> = reports.iter().filter(|r| seen.insert(r.short_id())).collect();
    let new_rows: Vec<String> = fresh.iter().copied().flat_map(history_rows).collect();
    if fresh.is_empty() && !existing.is_empty() {
        tracing::debug!(path = %path.display(), "history already up to date");
        return Ok(0);
    }
    let header_line = HISTORY_HEADER.lines().next().unwrap_or("");

    let content = if existing.is_empty() {
        let mut lines = vec![
            "# Latency History".to_string(),
            String::new(),
            HISTORY_HEADER.to_string(),
        ];
        lines.extend(new_rows);
        lines.push(String::new());
        lines.join("\n")
    } else if existing.contains(header_line) {
        let mut out = existing.trim_end().to_string();
        for row in &new_rows {
            out.push('\n');
            out.push_str(row);
        }
        out.push('\n');
        out
    } else {
        let mut out = existing;
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("\n## Latency History\n\n");
        out.push_str(HISTORY_HEADER);
        out.push('\n');
        for row in &new_rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    };

    std::fs::write(path, content)?;
    Ok(fresh.len())
}
