//! `megabridge` command-line front end.
//!
//! The binary in `main.rs` only parses arguments and initialises logging;
//! everything testable lives here.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
