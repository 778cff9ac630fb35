//! CLI module for docrest
//!
//! Provides command-line interface for:
//! - serve: run the demo API over HTTP
//! - check: validate a configuration file
//! - routes: list the demo API's endpoints

mod args;
mod commands;
mod demo;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check, routes, run, run_command, serve};
pub use demo::{build_api, build_api_with_store};
pub use errors::{CliError, CliErrorCode, CliResult};
