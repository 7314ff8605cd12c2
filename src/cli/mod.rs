//! CLI module for revcast
//!
//! Provides command-line interface for:
//! - start: Bootstrap the revision and serve
//! - fetch: One-shot query of the authority

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{fetch, run, run_command, start};
pub use config::{Config, DEFAULT_SECRET_ENV};
pub use errors::{CliError, CliErrorCode, CliResult};
