//! Chart Canvas
//!
//! Owned rendering context with an explicit lifecycle:
//! [`ChartCanvas::new`] opens the drawing surface, [`ChartCanvas::draw`] plots
//! the series, [`ChartCanvas::present`] writes the file and returns a
//! [`RenderedChart`] handle to the caller.

use crate::axis::{XAxis, format_point_value, value_range};
use crate::{X_AXIS_TITLE, Y_AXIS_TITLE};
use benchviz_report::GroupedResult;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TITLE_FONT_SIZE: u32 = 30;
const AXIS_LABEL_FONT_SIZE: u32 = 20;
const TICK_LABEL_FONT_SIZE: u32 = 14;
const LEGEND_FONT_SIZE: u32 = 16;
const ANNOTATION_FONT_SIZE: u32 = 12;

/// Pixel offset of an annotation from its point (up and to the left)
const ANNOTATION_OFFSET: (i32, i32) = (-20, -20);
/// Arrowhead at the point end of the annotation connector
const ARROW_HEAD: [(i32, i32); 3] = [(-7, -2), (0, 0), (-2, -7)];
const MARKER_SIZE: u32 = 4;
const LINE_WIDTH: u32 = 2;

const SERIES_COLORS: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Errors raised while rendering or presenting a chart
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chart backend error: {0}")]
    Backend(String),

    #[error("no display surface available to show {}", .0.display())]
    NoDisplay(PathBuf),

    #[error("failed to launch chart viewer `{viewer}`: {source}")]
    Viewer {
        viewer: String,
        #[source]
        source: std::io::Error,
    },

    #[error("chart viewer `{viewer}` exited with {status}")]
    ViewerExit {
        viewer: String,
        status: std::process::ExitStatus,
    },
}

fn backend_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Backend(e.to_string())
}

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark text on white
    #[default]
    Light,
    /// Light text on near-black
    Dark,
}

impl Theme {
    fn background(self) -> RGBColor {
        match self {
            Theme::Light => WHITE,
            Theme::Dark => RGBColor(24, 24, 27),
        }
    }

    fn foreground(self) -> RGBColor {
        match self {
            Theme::Light => BLACK,
            Theme::Dark => RGBColor(230, 230, 230),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

/// Figure settings
#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Caption above the plot
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Color theme
    pub theme: Theme,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "insert".to_string(),
            width: 960,
            height: 720,
            theme: Theme::Light,
        }
    }
}

/// Drawing surface backed by an SVG file
pub struct ChartCanvas<'a> {
    root: DrawingArea<SVGBackend<'a>, Shift>,
    path: &'a Path,
    options: ChartOptions,
}

impl<'a> ChartCanvas<'a> {
    /// Open a canvas that will be written to `path` on [`present`](Self::present).
    pub fn new(path: &'a Path, options: ChartOptions) -> Result<Self, RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RenderError::OutputDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
        root.fill(&options.theme.background())
            .map_err(backend_error)?;

        Ok(Self {
            root,
            path,
            options,
        })
    }

    /// Plot one line per group. With `show_data_val`, every point is labelled
    /// with its value.
    pub fn draw(&mut self, grouped: &GroupedResult, show_data_val: bool) -> Result<(), RenderError> {
        let fg = self.options.theme.foreground();
        let bg = self.options.theme.background();
        let axis = XAxis::for_result(grouped);

        let mut chart = ChartBuilder::on(&self.root)
            .caption(
                &self.options.title,
                ("sans-serif", TITLE_FONT_SIZE).into_font().color(&fg),
            )
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(axis.range(), value_range(grouped))
            .map_err(backend_error)?;

        let x_formatter = |x: &f64| axis.tick_label(*x);
        chart
            .configure_mesh()
            .x_labels(axis.tick_count())
            .x_label_formatter(&x_formatter)
            .x_desc(X_AXIS_TITLE)
            .y_desc(Y_AXIS_TITLE)
            .axis_style(fg)
            .bold_line_style(fg.mix(0.15))
            .light_line_style(fg.mix(0.05))
            .label_style(("sans-serif", TICK_LABEL_FONT_SIZE).into_font().color(&fg))
            .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE).into_font().color(&fg))
            .draw()
            .map_err(backend_error)?;

        let annotation_style = ("sans-serif", ANNOTATION_FONT_SIZE)
            .into_font()
            .color(&RED)
            .pos(Pos::new(HPos::Center, VPos::Bottom));

        for (idx, (name, series)) in grouped.iter().enumerate() {
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
            let points: Vec<(f64, f64)> = series
                .iter()
                .filter_map(|p| axis.coordinate(&p.case).map(|x| (x, p.value)))
                .collect();

            chart
                .draw_series(LineSeries::new(
                    points.iter().copied(),
                    color.stroke_width(LINE_WIDTH),
                ))
                .map_err(backend_error)?
                .label(name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH))
                });

            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&coord| Circle::new(coord, MARKER_SIZE, color.filled())),
                )
                .map_err(backend_error)?;

            if show_data_val {
                chart
                    .draw_series(points.iter().map(|&(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(0, 0), ANNOTATION_OFFSET], BLACK.stroke_width(1))
                            + PathElement::new(ARROW_HEAD.to_vec(), BLACK.stroke_width(1))
                            + Text::new(
                                format_point_value(y),
                                ANNOTATION_OFFSET,
                                annotation_style.clone(),
                            )
                    }))
                    .map_err(backend_error)?;
            }

            tracing::debug!(group = %name, points = points.len(), "plotted series");
        }

        if !grouped.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(bg.mix(0.8))
                .border_style(fg)
                .label_font(("sans-serif", LEGEND_FONT_SIZE).into_font().color(&fg))
                .draw()
                .map_err(backend_error)?;
        }

        Ok(())
    }

    /// Finish the drawing and write it out.
    pub fn present(self) -> Result<RenderedChart, RenderError> {
        self.root.present().map_err(backend_error)?;
        let path = self.path.to_path_buf();
        tracing::info!(path = %path.display(), "chart written");
        Ok(RenderedChart { path })
    }
}

/// A chart file written by [`ChartCanvas::present`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    /// Location of the written file
    pub path: PathBuf,
}
