//! Process Runner.
//!
//! Spawns an [`Invocation`], merges stdout and stderr into one
//! [`OutputLog`](megabridge_core::OutputLog) in arrival order, and calls the
//! progress callback once per new line with the cumulative log. Two flavours
//! share the same contract:
//!
//! - [`run_blocking`] - std process; the callback runs in-line on the
//!   calling thread
//! - [`run`] - tokio process; deferred callbacks are awaited before the
//!   next line is read
//!
//! Neither flavour retries or interprets the exit code; that is the
//! dispatcher's job.

mod blocking;
mod cooperative;
pub mod lines;

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use megabridge_core::{Invocation, MegatoolsError};

pub use blocking::run_blocking;
pub use cooperative::run;

/// Label used when tracing stdout lines.
const STDOUT: &str = "stdout";
/// Label used when tracing stderr lines.
const STDERR: &str = "stderr";

/// Map a spawn failure onto the error taxonomy.
fn spawn_error(program: &Path, err: io::Error) -> MegatoolsError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            MegatoolsError::executable_not_found(program, format!("failed to spawn: {err}"))
        }
        _ => MegatoolsError::Io(err),
    }
}

/// Return code of a finished process. A process killed by signal `N`
/// reports `-N`; anything else without a code reports `-1`.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}

/// Whether a process we sent a kill to actually died from it. A process
/// that exited by itself first keeps its own exit code.
fn ended_by_kill(kill_sent: bool, status: std::process::ExitStatus) -> bool {
    kill_sent && killed_by_signal(status)
}

#[cfg(unix)]
fn killed_by_signal(status: std::process::ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal().is_some()
}

#[cfg(not(unix))]
fn killed_by_signal(status: std::process::ExitStatus) -> bool {
    !status.success()
}

fn missing_pipe(name: &str) -> MegatoolsError {
    MegatoolsError::Io(io::Error::other(format!("missing {name} pipe")))
}

/// Build the command for `invocation`, running `program`.
///
/// stdin is closed so megatools can never block on a prompt; stdout and
/// stderr are piped for line capture. The tokio flavour converts this with
/// `tokio::process::Command::from`.
fn build_command(program: &Path, invocation: &Invocation) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(invocation.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = invocation.current_dir() {
        cmd.current_dir(dir);
    }
    cmd
}
