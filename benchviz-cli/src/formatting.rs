//! Output Formatting
//!
//! Human-readable table of a grouped result: one row per group, one column
//! per case label, `-` where a group has no point for that case.

use benchviz_report::{GroupedResult, case_labels};

/// Format a grouped result for terminal display
pub fn format_human_output(grouped: &GroupedResult, source: &str) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("benchviz Results\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!("Source: {}\n\n", source));

    if grouped.is_empty() {
        output.push_str("No benchmarks found.\n");
        return output;
    }

    let cases = case_labels(grouped);

    // Find max group name length for alignment
    let max_name_len = grouped.keys().map(|n| n.len()).max().unwrap_or(12).max(5);

    // Determine column width based on case labels and data
    let col_width = cases
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(8)
        .max(10); // At least 10 chars for numbers

    // Header row with case labels
    output.push_str(&format!("  {:<width$}", "group", width = max_name_len));
    for case in &cases {
        output.push_str(&format!(" | {:>w$}", case, w = col_width));
    }
    output.push('\n');

    // Separator
    output.push_str(&format!("  {}", "-".repeat(max_name_len)));
    for _ in &cases {
        output.push_str(&format!("-+-{}", "-".repeat(col_width)));
    }
    output.push('\n');

    // Data rows
    for (name, series) in grouped {
        output.push_str(&format!("  {:<width$}", name, width = max_name_len));
        for case in &cases {
            // First point wins when a case repeats within a series
            let formatted = series
                .iter()
                .find(|p| p.case == *case)
                .map(|p| format_value(p.value))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(" | {:>w$}", formatted, w = col_width));
        }
        output.push('\n');
    }

    let points: usize = grouped.values().map(Vec::len).sum();
    output.push_str(&format!(
        "\n  {} group(s), {} point(s)\n",
        grouped.len(),
        points
    ));

    output
}

/// Use scientific notation for very large/small numbers
fn format_value(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1_000_000.0 || value.abs() < 0.0001 {
        format!("{:.2e}", value)
    } else if value.abs() >= 1000.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.4}", value)
    }
}
