//! Terminal presentation for CLI commands.

pub mod progress;

pub use progress::CliProgressPrinter;
