#![warn(missing_docs)]
//! benchviz Chart - Line Chart Rendering
//!
//! Draws a [`GroupedResult`](benchviz_report::GroupedResult) as one line per
//! group, markers on every point, optional value annotations, and hands the
//! finished file to the host viewer.
//!
//! # Example
//!
//! ```ignore
//! let mut canvas = ChartCanvas::new(Path::new("chart.svg"), ChartOptions::default())?;
//! canvas.draw(&grouped, false)?;
//! let chart = canvas.present()?;
//! chart.open()?;
//! ```

mod axis;
mod canvas;
mod viewer;

pub use axis::{XAxis, format_point_value, value_range};
pub use canvas::{ChartCanvas, ChartOptions, RenderError, RenderedChart, Theme};
pub use viewer::display_available;

/// X axis title
pub const X_AXIS_TITLE: &str = "Batch size";

/// Y axis title
pub const Y_AXIS_TITLE: &str = "Millisecond";

/// Decimal places shown in point annotations
pub const ANNOTATION_PRECISION: i32 = 4;
