//! CLI argument definitions using clap
//!
//! Commands:
//! - revcast start --config <path> [--port <port>] [--authority-url <url>]
//! - revcast fetch --config <path> [--authority-url <url>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// revcast - pushes revision updates to connected WebSocket clients
#[derive(Parser, Debug)]
#[command(name = "revcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the initial revision and start serving
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./revcast.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,

        /// Override the configured authority base URL
        #[arg(long)]
        authority_url: Option<String>,
    },

    /// Print the revision currently reported by the authority and exit
    Fetch {
        /// Path to configuration file
        #[arg(long, default_value = "./revcast.json")]
        config: PathBuf,

        /// Override the configured authority base URL
        #[arg(long)]
        authority_url: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
