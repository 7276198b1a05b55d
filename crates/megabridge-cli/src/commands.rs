//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Download a file or folder link
    Download {
        /// Public mega.nz link (including the `#key` part)
        url: String,
        /// Directory (or file path) to download into
        #[arg(long)]
        path: Option<PathBuf>,
        /// Speed limit in KiB/s
        #[arg(long)]
        limit_speed: Option<u64>,
        /// Account username
        #[arg(long, requires = "password")]
        username: Option<String>,
        /// Account password
        #[arg(long, requires = "username")]
        password: Option<String>,
        /// Proxy URL, e.g. socks5://127.0.0.1:9050
        #[arg(long)]
        proxy: Option<String>,
        /// Start over instead of resuming a partial download
        #[arg(long)]
        disable_resume: bool,
        /// Tell megatools not to report progress
        #[arg(long)]
        no_progress: bool,
        /// Print megatools output as-is instead of a progress bar
        #[arg(long, conflicts_with = "json")]
        raw: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the name of the file behind a link without downloading it
    Filename {
        /// Public mega.nz link
        url: String,
    },

    /// Print the megatools version
    Version,

    /// Print the resolved megatools executable
    Which,
}
