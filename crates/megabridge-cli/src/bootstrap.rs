//! CLI bootstrap - the composition root.
//!
//! Gathers configuration from the environment and the command line and
//! resolves the megatools executable once, before any command runs.

use std::path::PathBuf;

use megabridge_core::MegatoolsConfig;
use megabridge_runtime::Megatools;
use tracing::debug;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Executable given with `--executable` (or `MEGATOOLS_PATH`).
    pub executable: Option<PathBuf>,
}

impl CliConfig {
    /// Fold the command-line overrides into the environment configuration.
    pub fn into_megatools_config(self) -> MegatoolsConfig {
        let config = MegatoolsConfig::from_env();
        match self.executable {
            Some(path) => config.with_executable(path),
            None => config,
        }
    }
}

/// Resolve the executable and build the dispatcher used by every handler.
pub fn bootstrap(config: CliConfig) -> Result<Megatools, CliError> {
    let megatools = Megatools::new(config.into_megatools_config())?;
    debug!(executable = %megatools.executable().display(), "megatools resolved");
    Ok(megatools)
}
