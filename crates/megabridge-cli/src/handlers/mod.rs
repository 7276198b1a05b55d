//! Command handlers.
//!
//! Each handler receives the resolved [`Megatools`](megabridge_runtime::Megatools)
//! from bootstrap, calls one dispatcher operation and formats the result for
//! the terminal. Handlers hold no megatools knowledge of their own.

pub mod download;
pub mod filename;
pub mod version;
pub mod which;
