//! CLI command implementations
//!
//! `start` boot sequence:
//! 1. Load configuration
//! 2. Read the webhook secret (fatal if missing)
//! 3. Fetch the initial revision from the authority (fatal on failure)
//! 4. Start the liveness monitor
//! 5. Bind and serve until Ctrl-C

use std::path::Path;
use std::sync::Arc;

use crate::bootstrap::{fetch_logged, HttpRevisionAuthority};
use crate::http_server::server::ServerParts;
use crate::http_server::{HttpServer, WebhookSecret};
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::realtime::{Broadcaster, LivenessMonitor};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Start {
            config,
            port,
            authority_url,
        } => start(&config, port, authority_url),
        Command::Fetch {
            config,
            authority_url,
        } => fetch(&config, authority_url),
    }
}

/// Load the config file and apply command-line overrides
fn load_config(
    config_path: &Path,
    port: Option<u16>,
    authority_url: Option<String>,
) -> CliResult<Config> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }
    if let Some(url) = authority_url {
        config.authority_url = url;
    }
    config.validate()?;
    Ok(config)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Start serving
pub fn start(
    config_path: &Path,
    port: Option<u16>,
    authority_url: Option<String>,
) -> CliResult<()> {
    log_event(Event::BootStart);

    let result = load_config(config_path, port, authority_url).and_then(|config| {
        let addr = config.http.socket_addr();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("addr", addr.as_str()), ("authority", config.authority_url.as_str())],
        );

        let secret = config.webhook_secret()?;
        runtime()?.block_on(serve(config, secret))
    });

    if let Err(ref e) = result {
        log_event_with_fields(Event::BootFailed, &[("error", e.to_string().as_str())]);
    }
    result
}

async fn serve(config: Config, secret: WebhookSecret) -> CliResult<()> {
    let authority = Arc::new(
        HttpRevisionAuthority::new(&config.authority_url)
            .map_err(|e| CliError::boot_failed(e.to_string()))?,
    );

    // Nothing is bound until the initial revision is known.
    let initial = fetch_logged(authority.as_ref())
        .await
        .map_err(|e| CliError::boot_failed(format!("Bootstrap fetch failed: {}", e)))?;

    let broadcaster = Arc::new(Broadcaster::new(initial));
    log_event_with_fields(Event::BootComplete, &[("revision", initial.to_string().as_str())]);

    let monitor =
        LivenessMonitor::with_period(Arc::clone(&broadcaster), config.heartbeat_interval()).spawn();

    let mut parts = ServerParts::new(broadcaster, authority, secret);
    parts.queue_capacity = config.outbound_queue_capacity;
    let server = HttpServer::new(config.http.clone(), parts);

    let result = server.start(shutdown_signal()).await;

    log_event(Event::ShutdownStart);
    monitor.stop().await;
    log_event(Event::ShutdownComplete);

    result.map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
}

async fn shutdown_signal() {
    // If the handler cannot be installed, serve until killed.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Print the authority's current revision
pub fn fetch(config_path: &Path, authority_url: Option<String>) -> CliResult<()> {
    let config = load_config(config_path, None, authority_url)?;
    let authority = HttpRevisionAuthority::new(&config.authority_url)
        .map_err(|e| CliError::boot_failed(e.to_string()))?;

    let revision = runtime()?
        .block_on(fetch_logged(&authority))
        .map_err(|e| CliError::boot_failed(format!("Fetch failed: {}", e)))?;

    println!("{}", revision);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::cli::errors::CliErrorCode;

    #[test]
    fn test_overrides_applied() {
        let dir = TempDir::new().unwrap();
        let config = load_config(
            &dir.path().join("revcast.json"),
            Some(9100),
            Some("http://127.0.0.1:1/api".to_string()),
        )
        .unwrap();

        assert_eq!(config.http.port, 9100);
        assert_eq!(config.authority_url, "http://127.0.0.1:1/api");
    }

    #[test]
    fn test_empty_authority_override_rejected() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&dir.path().join("revcast.json"), None, Some(" ".to_string()))
            .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_fetch_unreachable_authority_fails() {
        let dir = TempDir::new().unwrap();
        let err = fetch(
            &dir.path().join("revcast.json"),
            Some("http://127.0.0.1:9".to_string()),
        )
        .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::BootFailed);
    }
}
