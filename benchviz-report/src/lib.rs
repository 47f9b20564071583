#![warn(missing_docs)]
//! benchviz Report - Result Parsing and Grouping
//!
//! Turns the JSON emitted by a Google Benchmark binary
//! (`--benchmark_format=json`) into per-group series:
//! - Strict decoding of the `benchmarks` array ([`decode_records`])
//! - Grouping by the name prefix before the first `/` ([`group_records`])
//! - JSON re-serialization of the grouped result ([`generate_json_report`])

mod json;
mod record;
mod report;

pub use json::{GroupEntry, GroupedReport, generate_json_report};
pub use record::{BenchmarkContext, BenchmarkOutput, BenchmarkRecord, DecodeError, decode_records};
pub use report::{
    GroupedResult, NAME_DELIMITER, Series, SeriesPoint, case_labels, group_records,
    parse_benchmark_result, split_name,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Line chart rendered to an SVG file
    #[default]
    Chart,
    /// Human-readable terminal table
    Human,
    /// JSON dump of the grouped series
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chart" | "svg" => Ok(OutputFormat::Chart),
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
