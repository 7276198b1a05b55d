//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;
use megabridge_core::config::EXECUTABLE_ENV;

use crate::commands::Commands;

/// Download from mega.nz through the megatools binary.
#[derive(Parser)]
#[command(name = "megabridge")]
#[command(about = "Download files from mega.nz using megatools")]
#[command(version)]
pub struct Cli {
    /// Path to the megatools executable (searched on PATH when omitted)
    #[arg(long, global = true, env = EXECUTABLE_ENV)]
    pub executable: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
