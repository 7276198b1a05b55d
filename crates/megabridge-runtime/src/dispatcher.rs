//! Progress Dispatcher for megatools downloads.
//!
//! [`Megatools`] resolves the executable once at construction and then
//! specialises the runner for `dl` invocations: it picks the callback,
//! turns a failed exit into [`MegatoolsError::Mega`] and extracts the
//! downloaded file's name from the log.
//!
//! Per invocation the state is `NotStarted -> Running -> Succeeded | Failed`.
//! Nothing is retried here; callers re-invoke to retry.

use std::path::{Path, PathBuf};

use megabridge_core::{
    BlockingProgress, DownloadOptions, ExitStatus, ImmediateCallback, Invocation,
    MegatoolsConfig, MegatoolsError, MegatoolsResult, OutputLog, ProcessHandle, Progress,
    ProgressCallback, has_severity_tag, progress::strip_ansi, resolve_file_name,
};
use serde::Serialize;
use tracing::info;

use crate::resolve::resolve_executable;
use crate::runner;

/// Speed limit (KiB/s) used by metadata queries so they transfer next to
/// nothing before being terminated.
const PROBE_SPEED_LIMIT: u64 = 1;

/// Result of a successful download.
#[derive(Debug, Clone, Serialize)]
pub struct Download {
    /// Name of the downloaded file, as reported by megatools.
    pub file_name: Option<String>,
    /// Exit code and full output of the invocation.
    pub status: ExitStatus,
}

/// Handle to a resolved megatools executable.
#[derive(Debug, Clone)]
pub struct Megatools {
    executable: PathBuf,
    config: MegatoolsConfig,
}

impl Megatools {
    /// Resolve the executable for `config`.
    ///
    /// Fails with [`MegatoolsError::ExecutableNotFound`] if no runnable
    /// binary can be found.
    pub fn new(config: MegatoolsConfig) -> MegatoolsResult<Self> {
        let executable = resolve_executable(&config)?;
        info!("Using megatools at {}", executable.display());
        Ok(Self { executable, config })
    }

    /// Configure from `MEGATOOLS_PATH` / `MEGATOOLS_WORKDIR`.
    pub fn from_env() -> MegatoolsResult<Self> {
        Self::new(MegatoolsConfig::from_env())
    }

    /// Use a specific executable.
    pub fn with_executable(path: impl Into<PathBuf>) -> MegatoolsResult<Self> {
        Self::new(MegatoolsConfig::default().with_executable(path))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn config(&self) -> &MegatoolsConfig {
        &self.config
    }

    /// The invocation [`download`](Self::download) would run.
    pub fn download_invocation(&self, url: &str, options: &DownloadOptions) -> Invocation {
        self.prepare(Invocation::download(&self.executable, url, options))
    }

    // ------------------------------------------------------------------------
    // Blocking API
    // ------------------------------------------------------------------------

    /// Download `url`, blocking until megatools exits.
    pub fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: BlockingProgress,
    ) -> MegatoolsResult<Download> {
        let invocation = self.download_invocation(url, options);
        let mut callback = progress.into_callback();
        let status = self.execute_blocking(&invocation, callback.as_mut())?;
        finish_download(status)
    }

    /// Version of the megatools binary (e.g. `1.11.0`).
    pub fn version(&self) -> MegatoolsResult<String> {
        let invocation = self.prepare(Invocation::version(&self.executable));
        let status = self.execute_blocking(&invocation, None)?;
        check_status(&status)?;
        parse_version(&status.log)
    }

    /// Name of the file behind `url`, without downloading it.
    ///
    /// Starts a speed-limited download into the scratch directory and
    /// terminates it as soon as megatools prints its first line.
    pub fn filename(&self, url: &str) -> MegatoolsResult<String> {
        let invocation = self.probe_invocation(url);
        let mut callback: ImmediateCallback = Box::new(terminate_on_first_line);
        let status = self.execute_blocking(&invocation, Some(&mut callback))?;
        check_status(&status)?;
        parse_probe_name(&status.log)
    }

    /// Run any invocation through the blocking runner. The exit code is
    /// returned as-is, not checked.
    pub fn execute_blocking(
        &self,
        invocation: &Invocation,
        callback: Option<&mut ImmediateCallback>,
    ) -> MegatoolsResult<ExitStatus> {
        info!("Executing: {invocation}");
        runner::run_blocking(invocation, callback)
    }

    // ------------------------------------------------------------------------
    // Async API
    // ------------------------------------------------------------------------

    /// Download `url` on the current tokio runtime.
    ///
    /// Deferred callbacks are awaited once per line before reading resumes,
    /// so the caller can interleave other work between progress updates.
    pub async fn download_async(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: Progress,
    ) -> MegatoolsResult<Download> {
        let invocation = self.download_invocation(url, options);
        let mut callback = progress.into_callback();
        let status = self.execute(&invocation, callback.as_mut()).await?;
        finish_download(status)
    }

    /// Async form of [`version`](Self::version).
    pub async fn version_async(&self) -> MegatoolsResult<String> {
        let invocation = self.prepare(Invocation::version(&self.executable));
        let status = self.execute(&invocation, None).await?;
        check_status(&status)?;
        parse_version(&status.log)
    }

    /// Async form of [`filename`](Self::filename).
    pub async fn filename_async(&self, url: &str) -> MegatoolsResult<String> {
        let invocation = self.probe_invocation(url);
        let mut callback = ProgressCallback::immediate(terminate_on_first_line);
        let status = self.execute(&invocation, Some(&mut callback)).await?;
        check_status(&status)?;
        parse_probe_name(&status.log)
    }

    /// Run any invocation through the async runner. The exit code is
    /// returned as-is, not checked.
    pub async fn execute(
        &self,
        invocation: &Invocation,
        callback: Option<&mut ProgressCallback>,
    ) -> MegatoolsResult<ExitStatus> {
        info!("Executing: {invocation}");
        runner::run(invocation, callback).await
    }

    // ------------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------------

    fn prepare(&self, invocation: Invocation) -> Invocation {
        match (&self.config.working_dir, invocation.current_dir()) {
            (Some(dir), None) => invocation.working_dir(dir),
            _ => invocation,
        }
    }

    fn probe_invocation(&self, url: &str) -> Invocation {
        let options = DownloadOptions::new()
            .with_print_names(true)
            .with_limit_speed(PROBE_SPEED_LIMIT)
            .with_path(&self.config.scratch_dir);
        self.download_invocation(url, &options)
    }
}

/// Failed unless the exit code is 0 or the process was ended by a kill a
/// callback asked for. A process that exited on its own with a nonzero code
/// is a failure even if termination was requested afterwards.
fn check_status(status: &ExitStatus) -> MegatoolsResult<()> {
    if status.success() || status.terminated {
        Ok(())
    } else {
        Err(MegatoolsError::from_exit(status))
    }
}

fn finish_download(status: ExitStatus) -> MegatoolsResult<Download> {
    check_status(&status)?;
    Ok(Download {
        file_name: resolve_file_name(&status.log),
        status,
    })
}

/// Stop the probe once megatools reports a name. Severity-tagged lines are
/// diagnostics, so the process is left to exit with its own code.
#[allow(clippy::unnecessary_wraps)]
fn terminate_on_first_line(log: &OutputLog, handle: &ProcessHandle) -> anyhow::Result<()> {
    if log.last().is_some_and(is_name_candidate) {
        handle.terminate();
    }
    Ok(())
}

/// Second whitespace-separated word of the banner, e.g.
/// `megatools 1.11.0 - command line tools for Mega.nz` -> `1.11.0`.
fn parse_version(log: &OutputLog) -> MegatoolsResult<String> {
    let banner = log
        .iter()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| MegatoolsError::UnexpectedOutput("empty version output".to_string()))?;

    banner
        .split_whitespace()
        .nth(1)
        .map(String::from)
        .ok_or_else(|| MegatoolsError::UnexpectedOutput(banner.clone()))
}

fn is_name_candidate(line: &str) -> bool {
    !line.trim().is_empty() && !has_severity_tag(&strip_ansi(line))
}

/// Text before the first `:` of the first non-empty, untagged line.
fn parse_probe_name(log: &OutputLog) -> MegatoolsResult<String> {
    let line = log
        .iter()
        .find(|line| is_name_candidate(line))
        .ok_or_else(|| MegatoolsError::UnexpectedOutput("no file name reported".to_string()))?;

    let clean = strip_ansi(line);
    let name = clean.split(':').next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(MegatoolsError::UnexpectedOutput(line.clone()));
    }
    Ok(name.to_string())
}
