//! Configuration loading from benchviz.toml
//!
//! benchviz configuration can be specified in a `benchviz.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use anyhow::Context;
use benchviz_chart::Theme;
use benchviz_report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`BenchvizConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "benchviz.toml";

/// benchviz configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchvizConfig {
    /// Benchmark runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Pre-run build configuration
    #[serde(default)]
    pub build: BuildConfig,
    /// Visualization configuration
    #[serde(default)]
    pub visuals: VisualsConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for the benchmark executable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Benchmark executable
    #[serde(default)]
    pub executable: Option<PathBuf>,
    /// Arguments passed to the executable
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Timeout for the benchmark run (e.g., "60s", "5m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Captured result read instead of running the executable
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executable: None,
            args: default_args(),
            timeout: default_timeout(),
            fixture: None,
        }
    }
}

fn default_args() -> Vec<String> {
    vec!["--benchmark_format=json".to_string()]
}
fn default_timeout() -> String {
    "60s".to_string()
}

/// Build step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Run the build before every benchmark run
    #[serde(default)]
    pub enabled: bool,
    /// Build tool
    #[serde(default = "default_build_program")]
    pub program: PathBuf,
    /// Build tree
    #[serde(default = "default_build_directory")]
    pub directory: PathBuf,
    /// Target to build
    #[serde(default = "default_build_target")]
    pub target: String,
    /// Parallel jobs
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Timeout for the build (e.g., "10m")
    #[serde(default = "default_build_timeout")]
    pub timeout: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: default_build_program(),
            directory: default_build_directory(),
            target: default_build_target(),
            jobs: default_jobs(),
            timeout: default_build_timeout(),
        }
    }
}

fn default_build_program() -> PathBuf {
    PathBuf::from("cmake")
}
fn default_build_directory() -> PathBuf {
    PathBuf::from("cmake-build-debug")
}
fn default_build_target() -> String {
    "kv_benchmark".to_string()
}
fn default_jobs() -> usize {
    8
}
fn default_build_timeout() -> String {
    "10m".to_string()
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualsConfig {
    /// Chart caption
    #[serde(default = "default_title")]
    pub title: String,
    /// Color theme: "light" or "dark"
    #[serde(default)]
    pub theme: Theme,
    /// Chart width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Chart height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Label every point with its value
    #[serde(default)]
    pub annotate: bool,
}

impl Default for VisualsConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            theme: Theme::default(),
            width: default_width(),
            height: default_height(),
            annotate: false,
        }
    }
}

fn default_title() -> String {
    "insert".to_string()
}
fn default_width() -> u32 {
    960
}
fn default_height() -> u32 {
    720
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "chart", "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Chart file path; a fresh temporary file when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Show the chart in the host viewer after writing it
    #[serde(default = "default_open")]
    pub open: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            path: None,
            open: default_open(),
        }
    }
}

fn default_format() -> String {
    "chart".to_string()
}
fn default_open() -> bool {
    true
}

impl OutputConfig {
    /// Parsed output format
    pub fn format(&self) -> anyhow::Result<OutputFormat> {
        self.format.parse().map_err(anyhow::Error::msg)
    }
}

impl BenchvizConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load configuration by walking up from current directory.
    ///
    /// `Ok(None)` when no `benchviz.toml` exists; a file that fails to load is an error.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let dir = std::env::current_dir()?;
        Self::discover_from(dir)
    }

    /// Walk up from `dir` looking for `benchviz.toml`
    pub fn discover_from(mut dir: PathBuf) -> anyhow::Result<Option<Self>> {
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load(&config_path).with_context(|| {
                    format!("invalid configuration {}", config_path.display())
                })?;
                tracing::debug!(path = %config_path.display(), "loaded configuration");
                return Ok(Some(config));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# benchviz Configuration
# https://github.com/ml-rust/benchviz

[runner]
# Benchmark executable (uncomment to enable)
# executable = "cmake-build-debug/kv_benchmark"
# Arguments passed to the executable
args = ["--benchmark_format=json"]
# Timeout for the benchmark run
timeout = "60s"
# Read a captured result instead of running the executable (uncomment to enable)
# fixture = "result.json"

[build]
# Rebuild the benchmark target before running it
enabled = false
# Build tool, invoked as: <program> --build <directory> --target <target> -j <jobs>
program = "cmake"
directory = "cmake-build-debug"
target = "kv_benchmark"
jobs = 8
# Timeout for the build
timeout = "10m"

[visuals]
# Chart caption
title = "insert"
# Color theme: light or dark
theme = "light"
# Chart dimensions
width = 960
height = 720
# Label every point with its value
annotate = false

[output]
# Default output format: chart, human, json
format = "chart"
# Chart file (uncomment to keep it; a temporary file is used otherwise)
# path = "target/benchviz/chart.svg"
# Show the chart in the host viewer
open = true
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration number: {}", num_part));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64) as u64))
    }
}
