//! Process Runner
//!
//! Runs the benchmark executable (or the build tool) to completion and
//! captures its output. Both pipes are drained in the calling thread by
//! polling their descriptors, so a chatty child cannot block on a full pipe
//! while we wait for it. Every child is owned by a [`ChildGuard`] that kills
//! and reaps it on any early return.

use std::ffi::OsStr;
use std::io::Read;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Grace period between SIGTERM and SIGKILL
const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Upper bound on a single poll so the deadline is re-checked regularly
const POLL_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("executable not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to spawn {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {status}{}", program.display(), stderr_suffix(stderr))]
    NonZeroExit {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("timed out after {timeout:?} waiting for {}", program.display())]
    Timeout { program: PathBuf, timeout: Duration },

    #[error("I/O error while collecting output of {}: {source}", program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read fixture {}: {source}", path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Everything a finished process wrote, plus how it exited
#[derive(Debug)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitStatus,
}

/// Result of polling for data
#[derive(Debug)]
enum PollResult {
    Ready,
    Timeout,
    Error(std::io::Error),
}

/// Wait until any of `fds` is readable or hung up
fn wait_for_data(fds: &mut [libc::pollfd], timeout: Duration) -> PollResult {
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
    let result = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };

    if result < 0 {
        PollResult::Error(std::io::Error::last_os_error())
    } else if result == 0 {
        PollResult::Timeout
    } else {
        PollResult::Ready
    }
}

fn poll_entry(fd: RawFd) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }
}

fn is_ready(entry: &libc::pollfd) -> bool {
    entry.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0
}

/// Read one chunk from a ready pipe; drops the pipe at end of stream.
fn drain_ready<R: Read>(pipe: &mut Option<R>, sink: &mut Vec<u8>) -> std::io::Result<()> {
    let Some(reader) = pipe.as_mut() else {
        return Ok(());
    };
    let mut chunk = [0u8; 8192];
    match reader.read(&mut chunk) {
        Ok(0) => {
            *pipe = None;
            Ok(())
        }
        Ok(n) => {
            sink.extend_from_slice(&chunk[..n]);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(()),
        Err(e) => Err(e),
    }
}

/// Send SIGTERM to a process. Returns `Err` if the signal could not be delivered.
fn send_sigterm(pid: u32) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Owns a spawned child until it has been reaped
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    /// Poll for exit until `deadline`
    fn wait_until(&mut self, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                self.reaped = true;
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// SIGTERM, wait out the grace period, then SIGKILL and reap.
    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        // Ignore error: the child may already be gone
        let _ = send_sigterm(self.child.id());
        if let Ok(Some(_)) = self.wait_until(Instant::now() + TERMINATE_GRACE) {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Runs external programs with a bounded wait
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Create a runner that gives each process at most `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` with `args` and return its stdout.
    ///
    /// Fails if the program cannot be started, exits unsuccessfully, or
    /// outlives the timeout.
    pub fn run<S: AsRef<OsStr>>(&self, program: &Path, args: &[S]) -> Result<Vec<u8>, RunnerError> {
        let output = self.capture(program, args)?;
        if !output.status.success() {
            return Err(RunnerError::NonZeroExit {
                program: program.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }

    /// Run `program` and capture stdout, stderr and exit status without
    /// judging the status.
    pub fn capture<S: AsRef<OsStr>>(
        &self,
        program: &Path,
        args: &[S],
    ) -> Result<CapturedOutput, RunnerError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(
            program = %program.display(),
            args = ?args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>(),
            "spawning process"
        );

        let child = command.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RunnerError::NotFound(program.to_path_buf())
            } else {
                RunnerError::Spawn {
                    program: program.to_path_buf(),
                    source,
                }
            }
        })?;

        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut guard = ChildGuard::new(child);
        let mut stdout: Option<ChildStdout> = guard.child.stdout.take();
        let mut stderr: Option<ChildStderr> = guard.child.stderr.take();
        let mut out = Vec::new();
        let mut err = Vec::new();

        let io_error = |source| RunnerError::Io {
            program: program.to_path_buf(),
            source,
        };

        while stdout.is_some() || stderr.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(program, &mut guard));
            }

            let mut fds = Vec::with_capacity(2);
            if let Some(pipe) = &stdout {
                fds.push(poll_entry(pipe.as_raw_fd()));
            }
            let stderr_slot = fds.len();
            if let Some(pipe) = &stderr {
                fds.push(poll_entry(pipe.as_raw_fd()));
            }

            match wait_for_data(&mut fds, remaining.min(POLL_SLICE)) {
                PollResult::Ready => {}
                PollResult::Timeout => continue,
                PollResult::Error(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                PollResult::Error(e) => return Err(io_error(e)),
            }

            if stdout.is_some() && is_ready(&fds[0]) {
                drain_ready(&mut stdout, &mut out).map_err(io_error)?;
            }
            if stderr.is_some() && is_ready(&fds[stderr_slot]) {
                drain_ready(&mut stderr, &mut err).map_err(io_error)?;
            }
        }

        let status = match guard.wait_until(deadline).map_err(io_error)? {
            Some(status) => status,
            None => return Err(self.timed_out(program, &mut guard)),
        };

        tracing::debug!(
            program = %program.display(),
            %status,
            stdout_bytes = out.len(),
            stderr_bytes = err.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "process finished"
        );

        Ok(CapturedOutput {
            stdout: out,
            stderr: err,
            status,
        })
    }

    fn timed_out(&self, program: &Path, guard: &mut ChildGuard) -> RunnerError {
        tracing::warn!(program = %program.display(), timeout = ?self.timeout, "process timed out");
        guard.terminate();
        RunnerError::Timeout {
            program: program.to_path_buf(),
            timeout: self.timeout,
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// Read a previously captured benchmark output in full
pub fn read_fixture(path: &Path) -> Result<Vec<u8>, RunnerError> {
    let bytes = std::fs::read(path).map_err(|source| RunnerError::Fixture {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read fixture");
    Ok(bytes)
}

/// Where the benchmark JSON comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Run a benchmark executable
    Executable { path: PathBuf, args: Vec<String> },
    /// Read a captured output file
    Fixture { path: PathBuf },
}

impl DataSource {
    /// Fetch the raw benchmark bytes
    pub fn load(&self, runner: &ProcessRunner) -> Result<Vec<u8>, RunnerError> {
        match self {
            DataSource::Executable { path, args } => runner.run(path, args),
            DataSource::Fixture { path } => read_fixture(path),
        }
    }

    /// Path of the executable or fixture
    pub fn path(&self) -> &Path {
        match self {
            DataSource::Executable { path, .. } | DataSource::Fixture { path } => path,
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Executable { path, args } => {
                write!(f, "{}", path.display())?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            DataSource::Fixture { path } => write!(f, "fixture {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> &'static Path {
        Path::new("/bin/sh")
    }

    #[test]
    fn test_captures_stdout() {
        let runner = ProcessRunner::new(Duration::from_secs(10));
        let out = runner.run(sh(), &["-c", "printf hello"]).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_large_output_does_not_deadlock() {
        let runner = ProcessRunner::new(Duration::from_secs(30));
        let out = runner
            .run(
                sh(),
                &["-c", "head -c 300000 /dev/zero; head -c 100000 /dev/zero >&2"],
            )
            .unwrap();
        assert_eq!(out.len(), 300_000);
    }

    #[test]
    fn test_non_zero_exit_reports_stderr() {
        let runner = ProcessRunner::new(Duration::from_secs(10));
        let err = runner
            .run(sh(), &["-c", "echo boom >&2; exit 3"])
            .unwrap_err();
        match err {
            RunnerError::NonZeroExit { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr.trim(), "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_capture_keeps_failed_output() {
        let runner = ProcessRunner::new(Duration::from_secs(10));
        let output = runner
            .capture(sh(), &["-c", "echo partial; exit 1"])
            .unwrap();
        assert!(!output.status.success());
        assert_eq!(output.stdout, b"partial\n");
    }

    #[test]
    fn test_missing_executable() {
        let runner = ProcessRunner::default();
        let err = runner
            .run(Path::new("/nonexistent/kv_benchmark"), &["--benchmark_format=json"])
            .unwrap_err();
        assert!(matches!(err, RunnerError::NotFound(ref p) if p == Path::new("/nonexistent/kv_benchmark")));
    }

    #[test]
    fn test_timeout_kills_process() {
        let runner = ProcessRunner::new(Duration::from_millis(200));
        let start = Instant::now();
        let err = runner.run(sh(), &["-c", "exec sleep 10"]).unwrap_err();
        assert!(matches!(err, RunnerError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_fixture_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result");
        std::fs::write(&path, br#"{"benchmarks": []}"#).unwrap();

        let source = DataSource::Fixture { path: path.clone() };
        let bytes = source.load(&ProcessRunner::default()).unwrap();
        assert_eq!(bytes, br#"{"benchmarks": []}"#);
        assert_eq!(source.path(), path.as_path());
    }

    #[test]
    fn test_missing_fixture() {
        let err = read_fixture(Path::new("/nonexistent/result")).unwrap_err();
        assert!(matches!(err, RunnerError::Fixture { .. }));
    }

    #[test]
    fn test_executable_source_display() {
        let source = DataSource::Executable {
            path: PathBuf::from("build/kv_benchmark"),
            args: vec!["--benchmark_format=json".to_string()],
        };
        assert_eq!(
            source.to_string(),
            "build/kv_benchmark --benchmark_format=json"
        );
    }
}
