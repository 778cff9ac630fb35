//! CLI command implementations

use std::path::Path;

use crate::api::{ApiConfig, ApiServer};
use crate::observability::{Logger, Severity};

use super::args::Command;
use super::demo;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Check { config } => check(&config),
        Command::Routes { config } => routes(&config),
    }
}

/// Load the config and apply its log level
fn load_config(config_path: &Path) -> CliResult<ApiConfig> {
    let config = ApiConfig::load(config_path)?;
    if let Some(severity) = Severity::parse(&config.log_level) {
        Logger::set_min_severity(severity);
    }
    Ok(config)
}

/// Serve the demo API until the process is stopped
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }

    let api = demo::build_api(&config)?;
    let server = ApiServer::new(config, api);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print the effective configuration as JSON
pub fn check(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Print one line per demo resource: name, list endpoint, schema endpoint
pub fn routes(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let api = demo::build_api(&config)?;
    for (name, endpoint) in api.top_level() {
        println!("{}\t{}\t{}", name, endpoint.list_endpoint, endpoint.schema);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir, config: serde_json::Value) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("docrest.json");
        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_check_accepts_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({"port": 9100}));
        check(&config_path).unwrap();
    }

    #[test]
    fn test_check_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({"max_limit": 0}));

        let result = check(&config_path);
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_routes_requires_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = routes(&temp_dir.path().join("missing.json"));
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_routes_lists_demo_resources() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({"script_prefix": "/svc/"}));
        routes(&config_path).unwrap();
    }
}
