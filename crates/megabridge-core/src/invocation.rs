//! Argument vector for one execution of the external binary.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::options::DownloadOptions;

/// megatools subcommand used for downloads and metadata queries.
const DL_SUBCOMMAND: &str = "dl";

/// Flag that keeps megatools from prompting; the child never owns a terminal.
const NO_ASK_PASSWORD: &str = "--no-ask-password";

/// Arguments whose value is replaced when the command line is displayed.
const REDACTED_FLAGS: &[&str] = &["--password="];

/// One execution of the external binary.
///
/// Built with the consuming builder methods and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
}

impl Invocation {
    /// Start an invocation of `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// `megatools dl <url> --no-ask-password <options>`.
    pub fn download(program: impl Into<PathBuf>, url: &str, options: &DownloadOptions) -> Self {
        Self::new(program)
            .arg(DL_SUBCOMMAND)
            .arg(url)
            .arg(NO_ASK_PASSWORD)
            .args(options.to_args())
    }

    /// `megatools dl --version`.
    pub fn version(program: impl Into<PathBuf>) -> Self {
        Self::new(program).arg(DL_SUBCOMMAND).arg("--version")
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Run the process from `dir` instead of the caller's directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Path to the executable (the first element of the argument vector).
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments after the program path.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            match REDACTED_FLAGS.iter().find(|flag| arg.starts_with(**flag)) {
                Some(flag) => write!(f, " {flag}***")?,
                None => write!(f, " {arg}")?,
            }
        }
        Ok(())
    }
}
