//! Handler for `latbench run`.
//!
//! Builds the backends from resolved settings, runs Bedrock first and the
//! direct API second, prints a summary and then persists the report.

use crate::commands::RunArgs;
use crate::config::{BenchFile, CliConfig, RunSettings};
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ProgressReporter};
use latbench::report::{append_history, comparison_table, summary_table, to_json, write_report};
use latbench::{
    AnthropicBackend, AnthropicConfig, BackendCaller, BackendId, BedrockBackend, BedrockConfig,
    Benchmark, RunReport, RunnerConfig, TrialRunner,
};
use std::fmt::Write as _;

/// Execute `latbench run`.
pub async fn execute_run(config: &CliConfig, args: RunArgs) -> CliResult<()> {
    let file = match args.config.as_deref() {
        Some(path) => BenchFile::load(path)?,
        None => BenchFile::default(),
    };
    let settings = RunSettings::resolve(args, file)?;
    let benchmark = build_benchmark(&settings)?;

    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.header("Latency Benchmark");
    reporter.info(&format!(
        "{} -> {} ({} requests per backend)",
        settings.source_region, settings.target_region, settings.iterations
    ));

    let report = benchmark
        .run_observed(|event| reporter.on_event(event))
        .await?;
    tracing::info!(run_id = %report.run_id, requests = report.total_requests(), "run finished");

    // Results reach stdout even if saving them fails below.
    match settings.format {
        OutputFormat::Json => println!("{}", to_json(&report)?),
        OutputFormat::Text if !config.verbosity.is_quiet() => {
            print!("{}", render_summary(&report, &settings));
        }
        OutputFormat::Text => {}
    }

    let written = write_report(&settings.output_dir, &report).map_err(|e| {
        CliError::report_generation(format!(
            "cannot write results to {}: {e}",
            settings.output_dir.display()
        ))
    })?;
    for path in &written {
        reporter.success(&format!("Results written to {}", path.display()));
    }

    if let Some(history) = settings.history.as_deref() {
        append_history(history, std::slice::from_ref(&report)).map_err(|e| {
            CliError::report_generation(format!("cannot update {}: {e}", history.display()))
        })?;
        tracing::info!(path = %history.display(), "history updated");
        reporter.success(&format!("Updated {}", history.display()));
    }

    Ok(())
}

/// Assemble the benchmark: Bedrock always, the direct API with `--compare`.
pub fn build_benchmark(settings: &RunSettings) -> CliResult<Benchmark> {
    let runner = TrialRunner::new(
        RunnerConfig::default()
            .with_trials(settings.iterations)
            .with_pause(settings.pause),
    )?;

    let mut bedrock = BedrockConfig::new(settings.bedrock_api_key.expose())
        .with_model_id(settings.model_id.as_str())
        .with_target_region(settings.target_region.as_str());
    if let Some(endpoint) = settings.bedrock_endpoint.as_deref() {
        bedrock = bedrock.with_endpoint(endpoint);
    }

    let mut benchmark = Benchmark::new(runner, settings.prompt.clone()).with_backend(
        BackendCaller::new(BedrockBackend::new(bedrock)?).with_timeout(settings.bedrock_timeout),
    );

    if settings.compare {
        let key = settings
            .anthropic_api_key
            .as_ref()
            .ok_or_else(|| CliError::config("--compare needs an Anthropic API key"))?;
        let mut direct =
            AnthropicConfig::new(key.expose()).with_model(settings.direct_model_id.as_str());
        if let Some(url) = settings.direct_base_url.as_deref() {
            direct = direct.with_base_url(url);
        }
        benchmark = benchmark
            .with_backend(
                BackendCaller::new(AnthropicBackend::new(direct))
                    .with_timeout(settings.direct_timeout),
            )
            .compare(BackendId::Anthropic, BackendId::Bedrock);
    }

    Ok(benchmark)
}

/// Human-readable summary printed after a run.
pub fn render_summary(report: &RunReport, settings: &RunSettings) -> String {
    let mut out = String::from("\nBenchmark Results\n\n");

    let paired = report.comparison.as_ref().and_then(|cmp| {
        Some((
            cmp,
            report.summary(cmp.baseline())?,
            report.summary(cmp.comparand())?,
        ))
    });
    match paired {
        Some((cmp, baseline, comparand)) => {
            out.push_str(&comparison_table(cmp, baseline, comparand));
        }
        None => {
            for summary in report.summaries.values() {
                out.push_str(&summary_table(summary));
            }
        }
    }

    out.push_str("\nTest Information\n");
    let _ = writeln!(out, "  Source region:  {}", settings.source_region);
    let _ = writeln!(out, "  Target region:  {}", settings.target_region);
    for (backend, model) in &report.models {
        let _ = writeln!(out, "  {:<15} {model}", format!("{}:", backend.label()));
    }
    let _ = writeln!(out, "  Requests/backend: {}", report.trials_per_backend);
    let _ = writeln!(out, "  Total requests:   {}", report.total_requests());
    let _ = writeln!(out, "  Elapsed:          {:.1}s", report.elapsed_secs);
    out
}
