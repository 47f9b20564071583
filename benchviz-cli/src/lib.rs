#![warn(missing_docs)]
//! benchviz CLI Library
//!
//! Orchestrates one visualization run: optionally rebuild the benchmark
//! target, run the benchmark executable (or read a captured fixture), group
//! its records and render them.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     benchviz_cli::run()
//! }
//! ```

mod builder;
mod config;
mod formatting;
mod planner;
mod runner;

pub use builder::{BuildError, BuildStep};
pub use config::*;
pub use formatting::format_human_output;
pub use planner::select_records;
pub use runner::{CapturedOutput, DataSource, ProcessRunner, RunnerError, read_fixture};

use anyhow::Context;
use benchviz_chart::{ChartCanvas, ChartOptions, Theme};
use benchviz_report::{
    BenchmarkContext, GroupedReport, GroupedResult, OutputFormat, decode_records,
    generate_json_report, group_records,
};
use clap::{Parser, Subcommand};
use regex::Regex;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// benchviz CLI arguments
#[derive(Parser, Debug)]
#[command(name = "benchviz")]
#[command(author, version, about = "benchviz - chart Google Benchmark results")]
pub struct Cli {
    /// Optional subcommand (Run, List, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter benchmark records by regex pattern on their name
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Chart this group only
    #[arg(long)]
    pub group: Option<String>,

    /// Benchmark executable (overrides benchviz.toml)
    #[arg(long)]
    pub executable: Option<PathBuf>,

    /// Read a captured result instead of running the executable
    #[arg(long, conflicts_with = "executable")]
    pub fixture: Option<PathBuf>,

    /// Rebuild the benchmark target before running it
    #[arg(long)]
    pub build: bool,

    /// Output format: chart, human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (chart path, or stdout for human/json if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Label every point with its value
    #[arg(long)]
    pub annotate: bool,

    /// Write the chart without showing it in the host viewer
    #[arg(long)]
    pub no_open: bool,

    /// Chart caption
    #[arg(long)]
    pub title: Option<String>,

    /// Color theme: light or dark
    #[arg(long)]
    pub theme: Option<String>,

    /// Benchmark run timeout (e.g., "60s", "5m")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Configuration file (skips benchviz.toml discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, run, parse and render (default)
    Run,
    /// Print the groups and cases without rendering
    List,
    /// Print a default benchviz.toml
    Init,
}

/// Run the benchviz CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success, or the error of the first step that failed.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the benchviz CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    execute(cli, &|name| std::env::var_os(name))
}

/// Environment lookup consulted when showing the chart
type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<OsString>;

fn execute(cli: Cli, env: EnvLookup<'_>) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    if let Some(Commands::Init) = cli.command {
        print!("{}", BenchvizConfig::default_toml());
        return Ok(());
    }

    // Explicit --config, else discover benchviz.toml (CLI flags override)
    let config = match &cli.config {
        Some(path) => BenchvizConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => BenchvizConfig::discover()?.unwrap_or_default(),
    };

    let pipeline = Pipeline::from_cli(&cli, &config)?;
    let grouped = pipeline.collect()?;

    match cli.command {
        Some(Commands::List) => list_groups(&grouped),
        Some(Commands::Run) | None => render(&cli, &config, &pipeline, &grouped, env),
        Some(Commands::Init) => Ok(()),
    }
}

/// Install the stderr fmt subscriber once; later calls are no-ops.
fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "benchviz=debug"
    } else {
        "benchviz=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Ignore error: a subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The data-producing half of a run: build, load, decode, select, group.
#[derive(Debug)]
pub struct Pipeline {
    /// Build to run first, if enabled
    pub build: Option<BuildStep>,
    /// Where the benchmark bytes come from
    pub source: DataSource,
    /// Runner used for the benchmark executable
    pub runner: ProcessRunner,
    /// Record name filter; `None` keeps everything
    pub filter: Option<Regex>,
    /// Group filter
    pub group: Option<String>,
}

impl Pipeline {
    /// Resolve the pipeline by layering: benchviz.toml defaults → CLI overrides.
    pub fn from_cli(cli: &Cli, config: &BenchvizConfig) -> anyhow::Result<Self> {
        let source = match (&cli.fixture, &cli.executable) {
            (Some(path), _) => DataSource::Fixture { path: path.clone() },
            (None, Some(path)) => DataSource::Executable {
                path: path.clone(),
                args: config.runner.args.clone(),
            },
            (None, None) => match (&config.runner.fixture, &config.runner.executable) {
                (Some(path), _) => DataSource::Fixture { path: path.clone() },
                (None, Some(path)) => DataSource::Executable {
                    path: path.clone(),
                    args: config.runner.args.clone(),
                },
                (None, None) => anyhow::bail!(
                    "no benchmark source: pass --executable or --fixture, or set [runner] executable in benchviz.toml"
                ),
            },
        };

        let timeout_str = cli.timeout.as_deref().unwrap_or(&config.runner.timeout);
        let timeout = BenchvizConfig::parse_duration(timeout_str)
            .with_context(|| format!("invalid runner timeout `{}`", timeout_str))?;

        let build = if cli.build || config.build.enabled {
            let build_timeout = BenchvizConfig::parse_duration(&config.build.timeout)
                .with_context(|| format!("invalid build timeout `{}`", config.build.timeout))?;
            Some(BuildStep {
                program: config.build.program.clone(),
                directory: config.build.directory.clone(),
                target: config.build.target.clone(),
                jobs: config.build.jobs,
                timeout: build_timeout,
            })
        } else {
            None
        };

        let filter = if cli.filter == ".*" {
            None
        } else {
            Some(
                Regex::new(&cli.filter)
                    .with_context(|| format!("invalid filter pattern `{}`", cli.filter))?,
            )
        };

        Ok(Self {
            build,
            source,
            runner: ProcessRunner::new(timeout),
            filter,
            group: cli.group.clone(),
        })
    }

    /// Run every step up to and including grouping. The first failure aborts.
    pub fn collect(&self) -> anyhow::Result<GroupedResult> {
        if let Some(build) = &self.build {
            build.run()?;
        }

        tracing::info!(source = %self.source, "loading benchmark results");
        let bytes = self
            .source
            .load(&self.runner)
            .with_context(|| format!("failed to obtain benchmark results from {}", self.source))?;
        tracing::debug!(bytes = bytes.len(), "benchmark output captured");

        let output = decode_records(&bytes).context("failed to parse benchmark results")?;
        if let Some(context) = &output.context {
            log_context(context);
        }
        tracing::info!(records = output.benchmarks.len(), "decoded benchmark records");

        let records = select_records(output.benchmarks, self.filter.as_ref(), self.group.as_deref());
        Ok(group_records(&records))
    }
}

fn log_context(context: &BenchmarkContext) {
    tracing::info!(
        host = context.host_name.as_deref().unwrap_or("unknown"),
        cpus = context.num_cpus.unwrap_or(0),
        mhz = context.mhz_per_cpu.unwrap_or(0),
        build_type = context.library_build_type.as_deref().unwrap_or("unknown"),
        "benchmark context"
    );
    if context.library_build_type.as_deref() == Some("debug") {
        tracing::warn!("benchmark library was built in debug mode; timings may be unrepresentative");
    }
}

fn list_groups(grouped: &GroupedResult) -> anyhow::Result<()> {
    println!("benchviz Groups:");

    let mut total = 0;
    for (group, series) in grouped {
        println!("├── group: {}", group);
        for point in series {
            println!("│   ├── {} ({})", point.case, point.value);
            total += 1;
        }
    }

    println!("{} groups, {} points found.", grouped.len(), total);
    Ok(())
}

fn render(
    cli: &Cli,
    config: &BenchvizConfig,
    pipeline: &Pipeline,
    grouped: &GroupedResult,
    env: EnvLookup<'_>,
) -> anyhow::Result<()> {
    let format = match &cli.format {
        Some(f) => f.parse::<OutputFormat>().map_err(anyhow::Error::msg)?,
        None => config.output.format()?,
    };

    let output = match format {
        OutputFormat::Chart => return render_chart(cli, config, grouped, env),
        OutputFormat::Human => format_human_output(grouped, &pipeline.source.to_string()),
        OutputFormat::Json => {
            generate_json_report(&GroupedReport::new(pipeline.source.to_string(), grouped))?
        }
    };

    // Write output
    if let Some(ref path) = cli.output {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    Ok(())
}

fn render_chart(
    cli: &Cli,
    config: &BenchvizConfig,
    grouped: &GroupedResult,
    env: EnvLookup<'_>,
) -> anyhow::Result<()> {
    let path = match cli.output.as_ref().or(config.output.path.as_ref()) {
        Some(path) => path.clone(),
        None => scratch_chart_path()?,
    };
    let theme = match &cli.theme {
        Some(t) => t.parse::<Theme>().map_err(anyhow::Error::msg)?,
        None => config.visuals.theme,
    };
    let options = ChartOptions {
        title: cli.title.clone().unwrap_or_else(|| config.visuals.title.clone()),
        width: config.visuals.width,
        height: config.visuals.height,
        theme,
    };
    let show_data_val = cli.annotate || config.visuals.annotate;

    let mut canvas = ChartCanvas::new(&path, options).context("failed to prepare chart")?;
    canvas
        .draw(grouped, show_data_val)
        .context("failed to draw chart")?;
    let chart = canvas.present().context("failed to write chart")?;
    println!("Chart written to: {}", chart.path.display());

    if config.output.open && !cli.no_open {
        chart.open_with(env).context("failed to display chart")?;
    }

    Ok(())
}

/// Persistent temporary file for a chart nobody asked to keep
fn scratch_chart_path() -> anyhow::Result<PathBuf> {
    let (_file, path) = tempfile::Builder::new()
        .prefix("benchviz-")
        .suffix(".svg")
        .tempfile()
        .context("failed to create temporary chart file")?
        .keep()
        .context("failed to keep temporary chart file")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchviz_chart::RenderError;

    const FIXTURE: &str = r#"{
        "context": {"host_name": "devbox", "num_cpus": 8, "library_build_type": "release"},
        "benchmarks": [
            {"name": "insert/100", "cpu_time": 5.0, "time_unit": "ms"},
            {"name": "insert/200", "cpu_time": 9.0, "time_unit": "ms"},
            {"name": "lookup/100", "cpu_time": 2.0, "time_unit": "ms"}
        ]
    }"#;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["benchviz"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_fixture_pipeline_groups_records() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let cli = cli(&["--fixture", fixture.to_str().unwrap()]);
        let pipeline = Pipeline::from_cli(&cli, &BenchvizConfig::default()).unwrap();
        assert!(pipeline.build.is_none());
        assert!(pipeline.filter.is_none());

        let grouped = pipeline.collect().unwrap();
        let groups: Vec<_> = grouped.keys().map(String::as_str).collect();
        assert_eq!(groups, vec!["insert", "lookup"]);
        assert_eq!(grouped["insert"].len(), 2);
    }

    #[test]
    fn test_filter_applies_before_grouping() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let cli = cli(&["--fixture", fixture.to_str().unwrap(), "/100$"]);
        let grouped = Pipeline::from_cli(&cli, &BenchvizConfig::default())
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(grouped["insert"].len(), 1);
        assert_eq!(grouped["lookup"].len(), 1);
    }

    #[test]
    fn test_config_supplies_source_and_build() {
        let mut config = BenchvizConfig::default();
        config.runner.executable = Some(PathBuf::from("build/kv_benchmark"));
        config.build.enabled = true;

        let pipeline = Pipeline::from_cli(&cli(&[]), &config).unwrap();
        assert_eq!(
            pipeline.source,
            DataSource::Executable {
                path: PathBuf::from("build/kv_benchmark"),
                args: vec!["--benchmark_format=json".to_string()],
            }
        );
        let build = pipeline.build.unwrap();
        assert_eq!(build.target, "kv_benchmark");
        assert_eq!(build.timeout, std::time::Duration::from_secs(600));
        assert_eq!(pipeline.runner.timeout(), std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = BenchvizConfig::default();
        config.runner.fixture = Some(PathBuf::from("stale.json"));

        let cli = cli(&["--executable", "bin/bench", "--timeout", "5s"]);
        let pipeline = Pipeline::from_cli(&cli, &config).unwrap();
        assert_eq!(pipeline.source.path(), std::path::Path::new("bin/bench"));
        assert_eq!(pipeline.runner.timeout(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_missing_source_is_an_error() {
        assert!(Pipeline::from_cli(&cli(&[]), &BenchvizConfig::default()).is_err());
    }

    #[test]
    fn test_invalid_filter_is_an_error() {
        let cli = cli(&["--fixture", "result.json", "(unclosed"]);
        assert!(Pipeline::from_cli(&cli, &BenchvizConfig::default()).is_err());
    }

    #[test]
    fn test_missing_executable_aborts_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let chart = dir.path().join("chart.svg");

        let cli = cli(&[
            "--executable",
            "/nonexistent/kv_benchmark",
            "-o",
            chart.to_str().unwrap(),
        ]);
        let err = run_with_cli(cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RunnerError>(),
            Some(RunnerError::NotFound(_))
        ));
        assert!(!chart.exists());
    }

    #[test]
    fn test_failed_build_aborts_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let mut config = BenchvizConfig::default();
        config.build.program = PathBuf::from("false");

        let cli = cli(&["--fixture", fixture.to_str().unwrap(), "--build"]);
        let err = Pipeline::from_cli(&cli, &config)
            .unwrap()
            .collect()
            .unwrap_err();
        assert!(err.downcast_ref::<BuildError>().is_some());
    }

    #[test]
    fn test_render_chart_from_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        let chart = dir.path().join("out").join("chart.svg");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let cli = cli(&[
            "--fixture",
            fixture.to_str().unwrap(),
            "-o",
            chart.to_str().unwrap(),
            "--annotate",
            "--no-open",
            "--title",
            "lookup vs insert",
        ]);
        run_with_cli(cli).unwrap();

        let svg = std::fs::read_to_string(&chart).unwrap();
        assert!(svg.contains("lookup vs insert"));
        assert!(svg.contains("insert"));
        assert!(svg.contains("9.0"));
    }

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn test_default_run_without_display_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        let chart = dir.path().join("chart.svg");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let cli = cli(&["--fixture", fixture.to_str().unwrap(), "-o", chart.to_str().unwrap()]);
        let err = execute(cli, &|_| None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RenderError>(),
            Some(RenderError::NoDisplay(p)) if p == &chart
        ));
        // Rendering finished before the display step failed
        assert!(chart.exists());
    }

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn test_default_chart_goes_to_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let err = execute(cli(&["--fixture", fixture.to_str().unwrap()]), &|_| None).unwrap_err();
        let Some(RenderError::NoDisplay(path)) = err.downcast_ref::<RenderError>() else {
            panic!("unexpected error: {err:#}");
        };
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("svg"));
        assert!(std::fs::read_to_string(path).unwrap().contains("<svg"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_no_open_skips_display() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        let chart = dir.path().join("chart.svg");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let cli = cli(&[
            "--fixture",
            fixture.to_str().unwrap(),
            "-o",
            chart.to_str().unwrap(),
            "--no-open",
        ]);
        execute(cli, &|_| None).unwrap();
        assert!(chart.exists());
    }

    #[test]
    fn test_json_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("result.json");
        let out = dir.path().join("grouped.json");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let cli = cli(&[
            "--fixture",
            fixture.to_str().unwrap(),
            "--format",
            "json",
            "-o",
            out.to_str().unwrap(),
        ]);
        run_with_cli(cli).unwrap();

        let report: GroupedReport =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        let grouped = report.to_grouped();
        assert_eq!(grouped["insert"][1].case, "200");
        assert_eq!(grouped["lookup"][0].value, 2.0);
    }
}
