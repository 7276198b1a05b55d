//! Callback binding for progress reporting.
//!
//! A callback is tagged once, at registration, as either immediate (runs
//! in-line with output reading) or deferred (returns a future the runner
//! awaits before reading the next line). The runner branches on the tag; it
//! never probes the callback itself.

use std::fmt;
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::log::OutputLog;
use crate::progress::parse_progress_line;

/// Callback run synchronously with the cumulative log.
pub type ImmediateCallback =
    Box<dyn FnMut(&OutputLog, &ProcessHandle) -> anyhow::Result<()> + Send>;

/// Callback returning a future that is awaited before reading resumes.
pub type DeferredCallback =
    Box<dyn FnMut(OutputLog, ProcessHandle) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

// ============================================================================
// Process Handle
// ============================================================================

/// Handle to the running process, passed to every callback invocation.
///
/// Termination is a request: the runner kills the child as soon as the
/// current callback returns and then drains whatever output is left.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    terminate: Arc<AtomicBool>,
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            pid,
            terminate: Arc::new(AtomicBool::new(false)),
        }
    }

    /// OS process id, if the process is still known to the OS.
    pub const fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the runner to terminate the process.
    pub fn terminate(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }

    pub fn termination_requested(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Progress Callback
// ============================================================================

/// A caller-supplied progress callback.
pub enum ProgressCallback {
    Immediate(ImmediateCallback),
    Deferred(DeferredCallback),
}

impl ProgressCallback {
    /// Wrap a synchronous callback.
    pub fn immediate<F>(callback: F) -> Self
    where
        F: FnMut(&OutputLog, &ProcessHandle) -> anyhow::Result<()> + Send + 'static,
    {
        Self::Immediate(Box::new(callback))
    }

    /// Wrap a suspension-capable callback.
    pub fn deferred<F, Fut>(mut callback: F) -> Self
    where
        F: FnMut(OutputLog, ProcessHandle) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Deferred(Box::new(move |log, handle| callback(log, handle).boxed()))
    }

    /// Synchronous callback with a fixed set of extra arguments forwarded on
    /// every call.
    pub fn immediate_with<A, F>(args: A, mut callback: F) -> Self
    where
        A: Send + 'static,
        F: FnMut(&OutputLog, &ProcessHandle, &A) -> anyhow::Result<()> + Send + 'static,
    {
        Self::immediate(move |log, handle| callback(log, handle, &args))
    }

    /// Suspension-capable callback with extra arguments, cloned into each
    /// returned future.
    pub fn deferred_with<A, F, Fut>(args: A, mut callback: F) -> Self
    where
        A: Clone + Send + 'static,
        F: FnMut(OutputLog, ProcessHandle, A) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::deferred(move |log, handle| callback(log, handle, args.clone()))
    }

    /// The built-in renderer: echoes each new line to stdout.
    ///
    /// Progress lines redraw in place with `\r`; any other line is printed
    /// on its own row.
    pub fn echo() -> Self {
        Self::Immediate(echo_callback())
    }

    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(_) => f.write_str("ProgressCallback::Immediate"),
            Self::Deferred(_) => f.write_str("ProgressCallback::Deferred"),
        }
    }
}

impl From<ImmediateCallback> for ProgressCallback {
    fn from(callback: ImmediateCallback) -> Self {
        Self::Immediate(callback)
    }
}

fn echo_callback() -> ImmediateCallback {
    let mut redrawing = false;
    Box::new(move |log: &OutputLog, _handle: &ProcessHandle| {
        let Some(line) = log.last() else {
            return Ok(());
        };
        let mut stdout = io::stdout().lock();
        if parse_progress_line(line).is_some() {
            write!(stdout, "\r{line}")?;
            redrawing = true;
        } else {
            if redrawing {
                writeln!(stdout)?;
                redrawing = false;
            }
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()?;
        Ok(())
    })
}

// ============================================================================
// Progress Selection
// ============================================================================

/// How an async download reports progress.
#[derive(Debug, Default)]
pub enum Progress {
    /// Built-in renderer ([`ProgressCallback::echo`]).
    #[default]
    Default,
    /// Capture output without reporting it.
    Silent,
    Callback(ProgressCallback),
}

impl Progress {
    /// Resolve to the callback the runner should drive, if any.
    pub fn into_callback(self) -> Option<ProgressCallback> {
        match self {
            Self::Default => Some(ProgressCallback::echo()),
            Self::Silent => None,
            Self::Callback(callback) => Some(callback),
        }
    }
}

impl From<ProgressCallback> for Progress {
    fn from(callback: ProgressCallback) -> Self {
        Self::Callback(callback)
    }
}

/// How a blocking download reports progress. Only immediate callbacks can
/// be driven without a scheduler.
#[derive(Default)]
pub enum BlockingProgress {
    #[default]
    Default,
    Silent,
    Callback(ImmediateCallback),
}

impl BlockingProgress {
    /// Wrap a synchronous callback.
    pub fn callback<F>(callback: F) -> Self
    where
        F: FnMut(&OutputLog, &ProcessHandle) -> anyhow::Result<()> + Send + 'static,
    {
        Self::Callback(Box::new(callback))
    }

    pub fn into_callback(self) -> Option<ImmediateCallback> {
        match self {
            Self::Default => Some(echo_callback()),
            Self::Silent => None,
            Self::Callback(callback) => Some(callback),
        }
    }
}

impl fmt::Debug for BlockingProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Silent => f.write_str("Silent"),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}
