//! Process runtime for megabridge.
//!
//! - [`resolve`] - locate and validate the megatools executable
//! - [`runner`] - spawn an [`Invocation`](megabridge_core::Invocation), stream
//!   its output line by line and drive the progress callback
//! - [`Megatools`] - the download dispatcher built on top of the runner

#![deny(unsafe_code)]

mod dispatcher;
pub mod resolve;
pub mod runner;

pub use dispatcher::{Download, Megatools};
pub use resolve::{ensure_runnable, resolve_executable, validate_executable};
pub use runner::{run, run_blocking};

// Re-export core types so most callers only need this crate
pub use megabridge_core::{
    BlockingProgress, DownloadOptions, ExitStatus, ImmediateCallback, Invocation, IpProto, MegatoolsConfig,
    MegatoolsError, MegatoolsResult, OutputLog, ProcessHandle, Progress, ProgressCallback,
    TransferProgress,
};
