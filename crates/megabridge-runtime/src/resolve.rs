//! megatools binary resolution and validation.
//!
//! Resolution runs once, when a `Megatools` instance is built, and yields an
//! immutable path. The runner validates again right before spawning so a
//! binary removed in the meantime still fails with `ExecutableNotFound`
//! instead of a spawn error.

use std::path::{Path, PathBuf};

use megabridge_core::{MegatoolsConfig, MegatoolsError, MegatoolsResult, default_executable_path};
use tracing::{debug, warn};

/// Binary name searched for on `PATH`.
const SEARCH_NAME: &str = "megatools";

/// Resolve the megatools executable for `config`.
///
/// Precedence:
/// 1. `config.executable` (explicit path, or `MEGATOOLS_PATH` via
///    [`MegatoolsConfig::from_env`])
/// 2. `megatools` on `PATH`
/// 3. the platform default from [`default_executable_path`]
///
/// The chosen candidate must exist and be executable.
pub fn resolve_executable(config: &MegatoolsConfig) -> MegatoolsResult<PathBuf> {
    if let Some(path) = &config.executable {
        debug!("Using configured megatools: {}", path.display());
        return ensure_runnable(path);
    }

    if let Ok(path) = which::which(SEARCH_NAME) {
        debug!("Found megatools on PATH: {}", path.display());
        return validate_executable(&path);
    }

    let fallback = default_executable_path();
    warn!(
        "megatools not found on PATH, falling back to {}",
        fallback.display()
    );
    validate_executable(&fallback)
}

/// Turn `program` into a runnable path.
///
/// Bare names (`megatools`, `sh`) are looked up on `PATH`; anything with a
/// directory component is validated as-is.
pub fn ensure_runnable(program: &Path) -> MegatoolsResult<PathBuf> {
    if is_bare_name(program) {
        return which::which(program)
            .map_err(|e| MegatoolsError::executable_not_found(program, e.to_string()));
    }
    validate_executable(program)
}

/// Validate that a binary exists and is executable.
///
/// Returns the path made absolute against the current directory, so a
/// relative path keeps pointing at the same file when the process is later
/// started from another working directory.
pub fn validate_executable(path: &Path) -> MegatoolsResult<PathBuf> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        let reason = match e.kind() {
            std::io::ErrorKind::NotFound => "file does not exist".to_string(),
            std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => e.to_string(),
        };
        MegatoolsError::executable_not_found(path, reason)
    })?;

    if !metadata.is_file() {
        return Err(MegatoolsError::executable_not_found(path, "not a regular file"));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(MegatoolsError::executable_not_found(
                path,
                "file is not executable",
            ));
        }
    }

    Ok(std::path::absolute(path)?)
}

fn is_bare_name(program: &Path) -> bool {
    program.components().count() == 1
        && program
            .parent()
            .is_none_or(|parent| parent.as_os_str().is_empty())
        && !program.has_root()
}
