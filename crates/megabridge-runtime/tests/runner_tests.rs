//! Process Runner behaviour against real child processes.

#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{assert_growing_prefixes, recorder, snapshot_callback};
use megabridge_runtime::{
    ImmediateCallback, Invocation, MegatoolsError, OutputLog, ProcessHandle, ProgressCallback,
    run, run_blocking,
};
use tempfile::TempDir;

fn shell(script: &str) -> Invocation {
    Invocation::new("sh").arg("-c").arg(script)
}

#[test]
fn test_callback_sees_each_line_with_growing_log() {
    let lengths = recorder();
    let sink = Arc::clone(&lengths);
    let mut callback: ImmediateCallback = Box::new(move |log: &OutputLog, _handle: &ProcessHandle| {
        sink.lock().unwrap().push(log.len());
        Ok(())
    });

    let status = run_blocking(&shell("printf 'line1\\nline2\\n'"), Some(&mut callback)).unwrap();

    assert_eq!(*lengths.lock().unwrap(), [1, 2]);
    assert_eq!(status.log.lines(), ["line1", "line2"]);
    assert_eq!(status.code, 0);
    assert!(!status.terminated);
}

#[test]
fn test_every_snapshot_extends_the_previous_one() {
    let seen = recorder();
    let mut callback: ImmediateCallback = Box::new(snapshot_callback(&seen));

    let script = "for i in 1 2 3 4 5 6 7 8; do echo \"n$i\"; done";
    let status = run_blocking(&shell(script), Some(&mut callback)).unwrap();

    let snapshots = seen.lock().unwrap();
    assert_eq!(snapshots.len(), 8);
    assert_growing_prefixes(&snapshots);
    assert_eq!(snapshots.last().unwrap(), status.log.lines());
}

#[test]
fn test_progress_redraws_are_separate_lines() {
    let status = run_blocking(
        &shell("printf 'f: 10.00%%\\rf: 55.00%%\\rf: 100.00%%\\r\\ndone\\n'"),
        None,
    )
    .unwrap();

    assert_eq!(
        status.log.lines(),
        ["f: 10.00%", "f: 55.00%", "f: 100.00%", "done"]
    );
}

#[test]
fn test_stderr_is_merged_into_the_log() {
    let status = run_blocking(&shell("echo out; sleep 0.2; echo err >&2; exit 4"), None).unwrap();

    assert_eq!(status.log.lines(), ["out", "err"]);
    assert_eq!(status.code, 4);
}

#[test]
fn test_missing_executable_fails_before_spawn() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("megatools");

    let err = run_blocking(&Invocation::new(&missing).arg("dl"), None).unwrap_err();
    match err {
        MegatoolsError::ExecutableNotFound { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_callback_error_aborts_the_invocation() {
    let mut callback: ImmediateCallback =
        Box::new(|_log: &OutputLog, _handle: &ProcessHandle| Err(anyhow::anyhow!("stop here")));

    let started = Instant::now();
    let err = run_blocking(&shell("echo first; exec sleep 30"), Some(&mut callback)).unwrap_err();

    assert!(matches!(err, MegatoolsError::Callback(ref e) if e.to_string() == "stop here"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_terminate_request_kills_and_drains() {
    let mut callback: ImmediateCallback = Box::new(|log: &OutputLog, handle: &ProcessHandle| {
        if log.len() == 1 {
            assert!(handle.id().is_some());
            handle.terminate();
        }
        Ok(())
    });

    let started = Instant::now();
    let status = run_blocking(&shell("echo first; exec sleep 30"), Some(&mut callback)).unwrap();

    assert!(status.terminated);
    assert_ne!(status.code, 0);
    assert_eq!(status.log.lines(), ["first"]);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_terminate_after_exit_keeps_own_exit_code() {
    let mut callback: ImmediateCallback = Box::new(|_log: &OutputLog, handle: &ProcessHandle| {
        // Let the process exit before asking for termination
        std::thread::sleep(Duration::from_millis(300));
        handle.terminate();
        Ok(())
    });

    let status = run_blocking(&shell("echo 'ERROR: Invalid link' >&2; exit 3"), Some(&mut callback))
        .unwrap();

    assert!(!status.terminated);
    assert_eq!(status.code, 3);
}

#[test]
fn test_relative_program_survives_working_dir_change() {
    let exe_dir = tempfile::tempdir_in(".").unwrap();
    let relative = std::path::Path::new(".")
        .join(exe_dir.path().file_name().unwrap())
        .join("megatools");
    std::fs::write(&relative, "#!/bin/sh\necho ran\n").unwrap();
    std::fs::set_permissions(&relative, std::fs::Permissions::from_mode(0o755)).unwrap();
    let work = TempDir::new().unwrap();

    let status = run_blocking(&Invocation::new(&relative).working_dir(work.path()), None).unwrap();

    assert_eq!(status.code, 0);
    assert_eq!(status.log.lines(), ["ran"]);
}

#[test]
fn test_working_dir_is_applied() {
    let temp_dir = TempDir::new().unwrap();
    let status = run_blocking(&shell("pwd -P").working_dir(temp_dir.path()), None).unwrap();

    let expected = temp_dir.path().canonicalize().unwrap();
    assert_eq!(status.log.last(), Some(expected.to_str().unwrap()));
}

#[tokio::test]
async fn test_async_immediate_callback_matches_blocking() {
    let lengths = recorder();
    let sink = Arc::clone(&lengths);
    let mut callback = ProgressCallback::immediate(move |log, _handle| {
        sink.lock().unwrap().push(log.len());
        Ok(())
    });

    let status = run(&shell("printf 'line1\\nline2\\n'"), Some(&mut callback))
        .await
        .unwrap();

    assert_eq!(*lengths.lock().unwrap(), [1, 2]);
    assert_eq!(status.log.lines(), ["line1", "line2"]);
}

#[tokio::test]
async fn test_deferred_callback_is_awaited_per_line_in_order() {
    let seen = recorder();
    let sink = Arc::clone(&seen);
    let mut callback = ProgressCallback::deferred(move |log, _handle| {
        let sink = Arc::clone(&sink);
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            sink.lock().unwrap().push(log.lines().to_vec());
            Ok(())
        }
    });

    let status = run(&shell("seq 1 20"), Some(&mut callback)).await.unwrap();

    let snapshots = seen.lock().unwrap();
    assert_eq!(snapshots.len(), 20);
    assert_growing_prefixes(&snapshots);
    let expected: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
    assert_eq!(status.log.lines(), expected.as_slice());
}

#[tokio::test]
async fn test_deferred_callback_lets_other_tasks_run() {
    let ticks = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
    };

    let observed = recorder();
    let sink = Arc::clone(&observed);
    let counter = Arc::clone(&ticks);
    let mut callback = ProgressCallback::deferred(move |_log, _handle| {
        let sink = Arc::clone(&sink);
        let counter = Arc::clone(&counter);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            sink.lock()
                .unwrap()
                .push(counter.load(std::sync::atomic::Ordering::SeqCst));
            Ok(())
        }
    });

    run(&shell("echo a; echo b; echo c"), Some(&mut callback))
        .await
        .unwrap();
    ticker.abort();

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 3);
    assert!(observed.windows(2).all(|w| w[1] > w[0]));
}

#[tokio::test]
async fn test_async_terminate_request() {
    let mut callback = ProgressCallback::deferred(|_log, handle| async move {
        handle.terminate();
        Ok(())
    });

    let status = run(&shell("echo first; exec sleep 30"), Some(&mut callback))
        .await
        .unwrap();

    assert!(status.terminated);
    assert_ne!(status.code, 0);
    assert_eq!(status.log.lines(), ["first"]);
}

#[tokio::test]
async fn test_async_terminate_after_exit_keeps_own_exit_code() {
    let mut callback = ProgressCallback::deferred(|_log, handle| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.terminate();
        Ok::<_, anyhow::Error>(())
    });

    let status = run(&shell("echo 'ERROR: Invalid link' >&2; exit 3"), Some(&mut callback))
        .await
        .unwrap();

    assert!(!status.terminated);
    assert_eq!(status.code, 3);
}

#[tokio::test]
async fn test_async_callback_error_propagates() {
    let mut callback = ProgressCallback::deferred(|log, _handle| async move {
        anyhow::ensure!(log.len() < 2, "too many lines");
        Ok(())
    });

    let err = run(&shell("echo a; echo b; exec sleep 30"), Some(&mut callback))
        .await
        .unwrap_err();

    assert!(matches!(err, MegatoolsError::Callback(_)));
}

#[tokio::test]
async fn test_async_missing_executable() {
    let err = run(&Invocation::new("/nonexistent/megatools"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MegatoolsError::ExecutableNotFound { .. }));
}
