//! Build Step
//!
//! Optional pre-step that rebuilds the benchmark target before it is run,
//! e.g. `cmake --build cmake-build-debug --target kv_benchmark -j 8`.

use crate::runner::{ProcessRunner, RunnerError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("build of target `{target}` failed")]
pub struct BuildError {
    pub target: String,
    #[source]
    pub source: RunnerError,
}

/// An external build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    /// Build tool, `cmake` by default
    pub program: PathBuf,
    /// Build tree passed to `--build`
    pub directory: PathBuf,
    /// Target passed to `--target`
    pub target: String,
    /// Parallel jobs passed to `-j`
    pub jobs: usize,
    /// Upper bound on the build's runtime
    pub timeout: Duration,
}

impl BuildStep {
    /// Arguments handed to the build tool
    pub fn args(&self) -> Vec<String> {
        vec![
            "--build".to_string(),
            self.directory.display().to_string(),
            "--target".to_string(),
            self.target.clone(),
            "-j".to_string(),
            self.jobs.max(1).to_string(),
        ]
    }

    /// Run the build to completion; any failure aborts the pipeline.
    pub fn run(&self) -> Result<(), BuildError> {
        tracing::info!(
            program = %self.program.display(),
            directory = %self.directory.display(),
            target = %self.target,
            jobs = self.jobs,
            "building benchmark target"
        );

        let runner = ProcessRunner::new(self.timeout);
        let output = runner
            .run(&self.program, &self.args())
            .map_err(|source| BuildError {
                target: self.target.clone(),
                source,
            })?;

        tracing::debug!(bytes = output.len(), "build output captured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(program: &str) -> BuildStep {
        BuildStep {
            program: PathBuf::from(program),
            directory: PathBuf::from("cmake-build-debug"),
            target: "kv_benchmark".to_string(),
            jobs: 8,
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_cmake_style_arguments() {
        assert_eq!(
            step("cmake").args(),
            vec![
                "--build",
                "cmake-build-debug",
                "--target",
                "kv_benchmark",
                "-j",
                "8"
            ]
        );
    }

    #[test]
    fn test_zero_jobs_clamped() {
        let mut s = step("cmake");
        s.jobs = 0;
        assert_eq!(s.args().last().map(String::as_str), Some("1"));
    }

    #[test]
    fn test_successful_build() {
        // `true` ignores its arguments
        step("true").run().unwrap();
    }

    #[test]
    fn test_failed_build_is_reported() {
        let err = step("false").run().unwrap_err();
        assert_eq!(err.target, "kv_benchmark");
        assert!(matches!(err.source, RunnerError::NonZeroExit { .. }));
    }

    #[test]
    fn test_missing_build_tool() {
        let err = step("/nonexistent/cmake").run().unwrap_err();
        assert!(matches!(err.source, RunnerError::NotFound(_)));
    }
}
