//! JSON Output

use crate::report::{GroupedResult, SeriesPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grouped series with provenance, as written by `--format json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedReport {
    /// Generation time
    pub generated_at: DateTime<Utc>,
    /// Where the benchmark bytes came from (executable or fixture path)
    pub source: String,
    /// Groups in legend order
    pub groups: Vec<GroupEntry>,
}

/// One group and its ordered points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Group name
    pub name: String,
    /// Points in reported order
    pub points: Vec<SeriesPoint>,
}

impl GroupedReport {
    /// Snapshot a grouped result
    pub fn new(source: impl Into<String>, grouped: &GroupedResult) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.into(),
            groups: grouped
                .iter()
                .map(|(name, points)| GroupEntry {
                    name: name.clone(),
                    points: points.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild the grouped mapping, keeping group order
    pub fn to_grouped(&self) -> GroupedResult {
        self.groups
            .iter()
            .map(|g| (g.name.clone(), g.points.clone()))
            .collect()
    }
}

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &GroupedReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
