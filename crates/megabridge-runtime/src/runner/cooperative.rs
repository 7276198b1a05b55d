//! Async runner on tokio processes.
//!
//! stdout and stderr are raced with `tokio::select!`; whichever produces a
//! line first is appended to the log and handed to the callback. Deferred
//! callbacks are awaited in place, which is the one suspension point per
//! line: no further output is read until the callback's future completes.

use megabridge_core::{
    ExitStatus, Invocation, MegatoolsError, MegatoolsResult, OutputLog, ProcessHandle,
    ProgressCallback,
};
use tokio::process::{Child, Command};
use tracing::debug;

use super::lines::LineReader;
use super::{STDERR, STDOUT, build_command, ended_by_kill, exit_code, missing_pipe, spawn_error};
use crate::resolve::ensure_runnable;

/// Run `invocation` to completion on the current tokio runtime.
///
/// Immediate callbacks run in-line; deferred callbacks are awaited before
/// reading resumes. A callback error kills the process and is returned as
/// [`MegatoolsError::Callback`].
pub async fn run(
    invocation: &Invocation,
    mut callback: Option<&mut ProgressCallback>,
) -> MegatoolsResult<ExitStatus> {
    let program = ensure_runnable(invocation.program())?;
    let mut cmd = Command::from(build_command(&program, invocation));
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| spawn_error(&program, e))?;
    let handle = ProcessHandle::new(child.id());
    debug!(pid = ?child.id(), "spawned {}", program.display());

    let mut stdout = LineReader::new(child.stdout.take().ok_or_else(|| missing_pipe(STDOUT))?);
    let mut stderr = LineReader::new(child.stderr.take().ok_or_else(|| missing_pipe(STDERR))?);
    let mut stdout_open = true;
    let mut stderr_open = true;

    let mut log = OutputLog::new();
    let mut kill_sent = false;
    let mut termination_handled = false;

    while stdout_open || stderr_open {
        let (stream, next) = tokio::select! {
            next = stdout.next_line(), if stdout_open => (STDOUT, next),
            next = stderr.next_line(), if stderr_open => (STDERR, next),
        };

        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(stream, "stream closed");
                if stream == STDOUT {
                    stdout_open = false;
                } else {
                    stderr_open = false;
                }
                continue;
            }
            Err(e) => {
                reap(&mut child).await;
                return Err(MegatoolsError::Io(e));
            }
        };

        debug!(stream, "{line}");
        log.push(line);

        if let Some(callback) = callback.as_deref_mut() {
            if let Err(e) = dispatch(callback, &log, &handle).await {
                reap(&mut child).await;
                return Err(MegatoolsError::Callback(e));
            }
        }

        if handle.termination_requested() && !termination_handled {
            termination_handled = true;
            if matches!(child.try_wait(), Ok(None)) {
                debug!(pid = ?child.id(), "termination requested by callback");
                kill_sent = child.start_kill().is_ok();
            } else {
                debug!("termination requested after exit");
            }
        }
    }

    let status = child.wait().await?;
    Ok(ExitStatus::new(
        exit_code(status),
        log,
        ended_by_kill(kill_sent, status),
    ))
}

/// Invoke the callback according to its registration tag.
async fn dispatch(
    callback: &mut ProgressCallback,
    log: &OutputLog,
    handle: &ProcessHandle,
) -> anyhow::Result<()> {
    match callback {
        ProgressCallback::Immediate(f) => f(log, handle),
        ProgressCallback::Deferred(f) => f(log.clone(), handle.clone()).await,
    }
}

async fn reap(child: &mut Child) {
    // kill() also waits, so no zombie is left behind
    let _ = child.kill().await;
}
