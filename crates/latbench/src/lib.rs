//! Latbench: latency benchmarking for LLM inference backends.
//!
//! Sends the same prompt to a managed gateway (AWS Bedrock) and a direct
//! vendor API (Anthropic), times every call, and reports per-backend
//! statistics and the deltas between them.
//!
//! ## Pipeline
//!
//! ```text
//! TrialRunner -> BackendCaller (x N) -> Vec<Trial>
//!             -> Summary (per backend) -> Comparison -> RunReport -> report
//! ```
//!
//! Calls are strictly sequential. Failures are recorded as trials, never
//! raised; only configuration mistakes abort a run.

#![warn(missing_docs)]

pub mod backend;
pub mod benchmark;
pub mod caller;
pub mod compare;
pub mod report;
mod result;
pub mod runner;
pub mod stats;

pub use backend::{
    BackendId, Completion, InferenceBackend, Prompt, ScriptedBackend, ScriptedResponse,
    TransportError,
};
#[cfg(feature = "http")]
pub use backend::{AnthropicBackend, AnthropicConfig, BedrockBackend, BedrockConfig};
pub use benchmark::{BenchEvent, Benchmark, RunReport};
pub use caller::{BackendCaller, Trial, TrialOutcome};
pub use compare::{compare, Comparison, MetricComparison, MetricDelta};
pub use result::{BenchError, BenchResult};
pub use runner::{RunnerConfig, TrialRunner};
pub use stats::{percentile, LatencyStats, Metric, Summary};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::backend::{BackendId, InferenceBackend, Prompt};
    pub use super::benchmark::{Benchmark, RunReport};
    pub use super::caller::{BackendCaller, Trial};
    pub use super::compare::{compare, Comparison};
    pub use super::result::{BenchError, BenchResult};
    pub use super::runner::{RunnerConfig, TrialRunner};
    pub use super::stats::{Metric, Summary};
}
