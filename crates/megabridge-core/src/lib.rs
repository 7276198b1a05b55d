//! Core domain types for megabridge.
//!
//! This crate holds everything that describes an invocation of the external
//! `megatools` executable without actually running it:
//!
//! - [`Invocation`] - the argument vector and working directory
//! - [`DownloadOptions`] - typed `megatools dl` flags
//! - [`OutputLog`] / [`ExitStatus`] - what a finished invocation produced
//! - [`ProgressCallback`] / [`ProcessHandle`] - the callback binding
//! - [`TransferProgress`] - structured view of a megatools progress line
//! - [`MegatoolsConfig`] - executable and directory configuration
//! - [`MegatoolsError`] - the error taxonomy
//!
//! Process spawning lives in `megabridge-runtime`.

#![deny(unsafe_code)]

pub mod callback;
pub mod config;
pub mod error;
pub mod invocation;
pub mod log;
pub mod options;
pub mod progress;

pub use callback::{
    BlockingProgress, DeferredCallback, ImmediateCallback, ProcessHandle, Progress,
    ProgressCallback,
};
pub use config::{MegatoolsConfig, default_executable_path};
pub use error::{MegatoolsError, MegatoolsResult};
pub use invocation::Invocation;
pub use log::{ExitStatus, OutputLog};
pub use options::{DownloadOptions, IpProto};
pub use progress::{
    TransferProgress, has_severity_tag, name_line_prefix, parse_progress_line, resolve_file_name,
    strip_severity,
};
