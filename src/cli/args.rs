//! CLI argument definitions using clap
//!
//! Commands:
//! - docrest serve --config <path> [--port <port>]
//! - docrest check --config <path>
//! - docrest routes --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docrest - REST resources over a document store
#[derive(Parser, Debug)]
#[command(name = "docrest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the demo event/booking API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./docrest.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a configuration file and print the effective settings
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./docrest.json")]
        config: PathBuf,
    },

    /// Print the list endpoint of every demo resource
    Routes {
        /// Path to configuration file
        #[arg(long, default_value = "./docrest.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
