//! Command handlers, one module per subcommand.

pub mod bench;
pub mod report;

pub use bench::{build_benchmark, execute_run, render_summary};
pub use report::execute_report;
