//! Blocking runner on std processes.
//!
//! stdout and stderr are each drained by a reader thread into a rendezvous
//! channel. The calling thread is the only consumer: it owns the log, appends
//! each line and runs the callback before accepting the next line, so a
//! reader stays parked until its line has been handled.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::process::Child;
use std::sync::mpsc::{self, SyncSender};
use std::thread::{self, JoinHandle};

use megabridge_core::{
    ExitStatus, ImmediateCallback, Invocation, MegatoolsError, MegatoolsResult, OutputLog,
    ProcessHandle,
};
use tracing::debug;

use super::lines::LineSplitter;
use super::{STDERR, STDOUT, build_command, ended_by_kill, exit_code, missing_pipe, spawn_error};
use crate::resolve::ensure_runnable;

type Message = io::Result<(&'static str, String)>;

/// Run `invocation` to completion on the calling thread.
///
/// `callback` is invoked once per output line with the cumulative log and a
/// handle to the running process. A callback error kills the process and is
/// returned as [`MegatoolsError::Callback`].
pub fn run_blocking(
    invocation: &Invocation,
    mut callback: Option<&mut ImmediateCallback>,
) -> MegatoolsResult<ExitStatus> {
    let program = ensure_runnable(invocation.program())?;
    let mut child = build_command(&program, invocation)
        .spawn()
        .map_err(|e| spawn_error(&program, e))?;
    let handle = ProcessHandle::new(Some(child.id()));
    debug!(pid = child.id(), "spawned {}", program.display());

    let stdout = child.stdout.take().ok_or_else(|| missing_pipe(STDOUT))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe(STDERR))?;

    let (tx, rx) = mpsc::sync_channel::<Message>(0);
    let readers = [
        spawn_reader(STDOUT, stdout, tx.clone()),
        spawn_reader(STDERR, stderr, tx),
    ];

    let mut log = OutputLog::new();
    let mut kill_sent = false;
    let mut termination_handled = false;

    for message in rx.iter() {
        let (stream, line) = match message {
            Ok(message) => message,
            Err(e) => {
                reap(&mut child);
                return Err(MegatoolsError::Io(e));
            }
        };

        debug!(stream, "{line}");
        log.push(line);

        if let Some(callback) = callback.as_mut() {
            if let Err(e) = callback(&log, &handle) {
                reap(&mut child);
                return Err(MegatoolsError::Callback(e));
            }
        }

        if handle.termination_requested() && !termination_handled {
            termination_handled = true;
            if matches!(child.try_wait(), Ok(None)) {
                debug!(pid = child.id(), "termination requested by callback");
                kill_sent = child.kill().is_ok();
            } else {
                debug!(pid = child.id(), "termination requested after exit");
            }
        }
    }

    for reader in readers {
        let _ = reader.join();
    }

    let status = child.wait()?;
    Ok(ExitStatus::new(
        exit_code(status),
        log,
        ended_by_kill(kill_sent, status),
    ))
}

fn spawn_reader(
    stream: &'static str,
    mut pipe: impl Read + Send + 'static,
    tx: SyncSender<Message>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut splitter = LineSplitter::new();
        let mut ready = VecDeque::new();
        let mut chunk = [0u8; 8 * 1024];

        loop {
            let n = match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            };
            splitter.feed(&chunk[..n], &mut ready);
            for line in ready.drain(..) {
                // Receiver gone means the runner bailed out; stop reading
                if tx.send(Ok((stream, line))).is_err() {
                    return;
                }
            }
        }

        if let Some(line) = splitter.finish() {
            let _ = tx.send(Ok((stream, line)));
        }
        debug!(stream, "reader thread exiting");
    })
}

/// Kill and reap the child after an early exit from the read loop.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
