//! Grouped Result Data Structures
//!
//! A benchmark name such as `kv_flat_map/1024` is split at its first `/`:
//! the prefix names the group (one chart line), the suffix labels the case
//! (one point on that line).

use crate::record::{BenchmarkRecord, DecodeError, decode_records};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Separator between group and case in a benchmark name
pub const NAME_DELIMITER: char = '/';

/// Single (case, value) point of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Case label (text after the first delimiter)
    pub case: String,
    /// Measured value
    pub value: f64,
}

impl SeriesPoint {
    /// Create a point
    pub fn new(case: impl Into<String>, value: f64) -> Self {
        Self {
            case: case.into(),
            value,
        }
    }
}

/// Points of one group in the order their records were reported
pub type Series = Vec<SeriesPoint>;

/// Group name to series, groups kept in first-appearance order
pub type GroupedResult = IndexMap<String, Series>;

/// Split a benchmark name into `(group, case)` at the first delimiter.
///
/// A name without a delimiter is a group of its own with an empty case label.
pub fn split_name(name: &str) -> (&str, &str) {
    name.split_once(NAME_DELIMITER).unwrap_or((name, ""))
}

/// Group records by name prefix, preserving input order within each group.
pub fn group_records(records: &[BenchmarkRecord]) -> GroupedResult {
    let mut grouped = GroupedResult::new();
    for record in records {
        let (group, case) = split_name(&record.name);
        grouped
            .entry(group.to_string())
            .or_default()
            .push(SeriesPoint::new(case, record.cpu_time));
    }
    grouped
}

/// Decode raw benchmark output and group it in one step.
pub fn parse_benchmark_result(bytes: &[u8]) -> Result<GroupedResult, DecodeError> {
    let output = decode_records(bytes)?;
    Ok(group_records(&output.benchmarks))
}

/// Distinct case labels across all series, in first-appearance order.
pub fn case_labels(grouped: &GroupedResult) -> Vec<&str> {
    let labels: IndexSet<&str> = grouped
        .values()
        .flat_map(|series| series.iter().map(|p| p.case.as_str()))
        .collect();
    labels.into_iter().collect()
}
