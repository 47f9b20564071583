#![warn(missing_docs)]
//! # benchviz
//!
//! Charts the output of Google Benchmark binaries.
//!
//! benchviz runs a benchmark executable with `--benchmark_format=json` (or
//! reads a captured result), groups the records by the name prefix before
//! the first `/`, and draws one latency line per group:
//! - **Build step**: optionally rebuilds the benchmark target with `cmake` first
//! - **Bounded runs**: benchmark and build processes are killed on timeout
//! - **Stable grouping**: groups and points keep the order they were reported in
//! - **Chart, table or JSON**: SVG line chart, terminal table, or grouped JSON
//!
//! ## Quick Start
//!
//! ```ignore
//! use benchviz::prelude::*;
//!
//! let grouped = parse_benchmark_result(&std::fs::read("result.json")?)?;
//! let path = std::path::Path::new("chart.svg");
//! let mut canvas = ChartCanvas::new(path, ChartOptions::default())?;
//! canvas.draw(&grouped, true)?;
//! canvas.present()?;
//! ```

// Re-export parsing and grouping
pub use benchviz_report::{
    BenchmarkContext, BenchmarkOutput, BenchmarkRecord, DecodeError, GroupedReport,
    GroupedResult, OutputFormat, Series, SeriesPoint, decode_records, group_records,
    parse_benchmark_result, split_name,
};

// Re-export rendering
pub use benchviz_chart::{ChartCanvas, ChartOptions, RenderError, RenderedChart, Theme};

// Re-export orchestration
pub use benchviz_cli::{
    BenchvizConfig, BuildError, BuildStep, Cli, DataSource, Pipeline, ProcessRunner,
    RunnerError,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ChartCanvas, ChartOptions, GroupedResult, Theme, group_records, parse_benchmark_result,
    };
}

/// Run the benchviz CLI.
///
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     benchviz::run()
/// }
/// ```
pub use benchviz_cli::{run, run_with_cli};
