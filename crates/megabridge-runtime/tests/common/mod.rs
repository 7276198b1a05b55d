//! Shared fixtures: fake megatools executables written as shell scripts.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use megabridge_runtime::{OutputLog, ProcessHandle};
use tempfile::TempDir;

/// Write an executable `/bin/sh` script named `megatools` into `dir`.
pub fn fake_megatools(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("megatools");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Shared recorder that callbacks append to.
pub type Recorder<T> = Arc<Mutex<Vec<T>>>;

pub fn recorder<T>() -> Recorder<T> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of every log a callback was handed.
pub fn snapshot_callback(
    seen: &Recorder<Vec<String>>,
) -> impl FnMut(&OutputLog, &ProcessHandle) -> anyhow::Result<()> + Send + 'static {
    let seen = Arc::clone(seen);
    move |log: &OutputLog, _handle: &ProcessHandle| {
        seen.lock().unwrap().push(log.lines().to_vec());
        Ok(())
    }
}

/// Assert that each snapshot extends the previous one by exactly one line.
pub fn assert_growing_prefixes(snapshots: &[Vec<String>]) {
    for pair in snapshots.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        assert_eq!(after.len(), before.len() + 1, "log must grow by one line");
        assert_eq!(&after[..before.len()], before.as_slice(), "log must never be rewritten");
    }
}
