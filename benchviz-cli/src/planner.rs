//! Record Selection
//!
//! Narrows the decoded records before grouping.
//!
//! Filtering options:
//! - Regex pattern matching on the full record name
//! - Group filtering (exact match on the prefix before the first `/`)
//!
//! Ordering: records keep the order the benchmark binary reported them in.

use benchviz_report::{BenchmarkRecord, split_name};

/// Select the records to chart
pub fn select_records(
    records: Vec<BenchmarkRecord>,
    filter: Option<&regex::Regex>,
    group: Option<&str>,
) -> Vec<BenchmarkRecord> {
    let total = records.len();
    let selected: Vec<_> = records
        .into_iter()
        .filter(|r| {
            // Apply regex filter on the record name
            if let Some(re) = filter {
                if !re.is_match(&r.name) {
                    return false;
                }
            }

            // Apply group filter
            if let Some(g) = group {
                if split_name(&r.name).0 != g {
                    return false;
                }
            }

            true
        })
        .collect();

    tracing::debug!(total, selected = selected.len(), "selected records");
    selected
}
