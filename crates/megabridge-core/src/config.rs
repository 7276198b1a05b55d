//! Configuration for locating and running megatools.
//!
//! Resolution of the executable itself (PATH lookup, validation) happens in
//! `megabridge-runtime`; this module only gathers what the caller asked for.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable holding an explicit path to the megatools binary.
pub const EXECUTABLE_ENV: &str = "MEGATOOLS_PATH";

/// Environment variable holding the working directory for invocations.
pub const WORKDIR_ENV: &str = "MEGATOOLS_WORKDIR";

#[cfg(target_os = "windows")]
const EXECUTABLE_NAME: &str = "megatools.exe";

#[cfg(not(target_os = "windows"))]
const EXECUTABLE_NAME: &str = "megatools";

/// Settings for a `Megatools` instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MegatoolsConfig {
    /// Explicit executable path. When unset, the runtime searches `PATH`
    /// and then falls back to [`default_executable_path`].
    pub executable: Option<PathBuf>,
    /// Working directory for every invocation (defaults to the caller's).
    pub working_dir: Option<PathBuf>,
    /// Directory used by metadata queries that have to write somewhere.
    pub scratch_dir: PathBuf,
}

impl Default for MegatoolsConfig {
    fn default() -> Self {
        Self {
            executable: None,
            working_dir: None,
            scratch_dir: env::temp_dir(),
        }
    }
}

impl MegatoolsConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let executable = non_empty(EXECUTABLE_ENV).map(PathBuf::from);
        let working_dir = non_empty(WORKDIR_ENV).map(PathBuf::from);
        if let Some(path) = &executable {
            debug!("{EXECUTABLE_ENV} set to {}", path.display());
        }

        Self {
            executable,
            working_dir,
            ..Self::default()
        }
    }

    /// Use this executable instead of searching for one.
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }
}

/// Platform default location of the megatools binary.
pub fn default_executable_path() -> PathBuf {
    env::temp_dir().join(EXECUTABLE_NAME)
}
