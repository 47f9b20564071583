//! Axis Layout
//!
//! Decides how case labels map onto the x axis. When every label is a number
//! (the usual `group/<batch size>` naming) points sit at their numeric value;
//! otherwise each distinct label gets a slot in first-appearance order.

use crate::ANNOTATION_PRECISION;
use benchviz_report::{GroupedResult, case_labels};
use std::ops::Range;

/// Horizontal axis layout for a chart
#[derive(Debug, Clone, PartialEq)]
pub enum XAxis {
    /// Labels parsed as numbers, plotted at their value
    Numeric {
        /// Smallest case value
        min: f64,
        /// Largest case value
        max: f64,
    },
    /// One evenly spaced slot per distinct label
    Categorical {
        /// Distinct labels in first-appearance order
        labels: Vec<String>,
    },
}

impl XAxis {
    /// Pick the layout for a grouped result
    pub fn for_result(grouped: &GroupedResult) -> Self {
        let labels = case_labels(grouped);
        let numeric: Option<Vec<f64>> = labels.iter().map(|l| parse_numeric(l)).collect();

        match numeric {
            Some(values) if !values.is_empty() => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                XAxis::Numeric { min, max }
            }
            _ => XAxis::Categorical {
                labels: labels.into_iter().map(str::to_string).collect(),
            },
        }
    }

    /// Plot range including padding
    pub fn range(&self) -> Range<f64> {
        match self {
            XAxis::Numeric { min, max } => pad(*min, *max),
            XAxis::Categorical { labels } => -0.5..(labels.len().max(1) as f64 - 0.5),
        }
    }

    /// X coordinate of a case label, `None` if the label is not on this axis
    pub fn coordinate(&self, case: &str) -> Option<f64> {
        match self {
            XAxis::Numeric { .. } => parse_numeric(case),
            XAxis::Categorical { labels } => {
                labels.iter().position(|l| l == case).map(|i| i as f64)
            }
        }
    }

    /// Number of tick labels to request from the mesh
    pub fn tick_count(&self) -> usize {
        match self {
            XAxis::Numeric { .. } => 10,
            XAxis::Categorical { labels } => labels.len().max(1),
        }
    }

    /// Text for a tick at `x`
    pub fn tick_label(&self, x: f64) -> String {
        match self {
            XAxis::Numeric { .. } => format_number(x),
            XAxis::Categorical { labels } => {
                let idx = x.round();
                if idx < 0.0 || (x - idx).abs() > 0.3 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }
}

/// Y range spanning all values with a 5% margin
pub fn value_range(grouped: &GroupedResult) -> Range<f64> {
    let (min, max) = grouped
        .values()
        .flatten()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return 0.0..1.0;
    }
    pad(min, max)
}

/// Annotation text: value rounded to four decimals, trailing zeros dropped
pub fn format_point_value(value: f64) -> String {
    let scale = 10f64.powi(ANNOTATION_PRECISION);
    let rounded = (value * scale).round() / scale;
    let text = format!("{:.*}", ANNOTATION_PRECISION as usize, rounded);
    let trimmed = text.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn parse_numeric(label: &str) -> Option<f64> {
    label.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn pad(min: f64, max: f64) -> Range<f64> {
    let span = max - min;
    let margin = if span > f64::EPSILON {
        span * 0.05
    } else {
        min.abs().max(1.0) * 0.5
    };
    (min - margin)..(max + margin)
}

fn format_number(x: f64) -> String {
    if x.fract().abs() < 1e-9 {
        format!("{:.0}", x)
    } else {
        format!("{:.2}", x)
    }
}
