//! gjp-portal - Global Journal submission portal client
//!
//! Resolves configuration, initializes logging, opens the local store and
//! runs one command.

use anyhow::{Context, Result};
use clap::Parser;
use gjp_common::config::{load_config_or_default, LoggingConfig, PortalConfig};
use gjp_portal::cli::{self, Cli, TerminalNavigator};
use gjp_portal::{Navigator, Portal, PortalError, Route};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Config problems are reported on stderr before the real subscriber exists
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let toml_config =
        tracing::subscriber::with_default(bootstrap, || load_config_or_default(args.config.as_deref()));

    init_tracing(&toml_config.logging)?;

    info!(
        "Starting gjp-portal v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = PortalConfig::resolve(
        &toml_config,
        args.root_folder.as_deref(),
        args.base_url.as_deref(),
    )
    .context("Invalid configuration")?;
    debug!(
        root_folder = %config.root_folder.display(),
        base_url = %config.base_url,
        "Configuration resolved"
    );

    let portal = Portal::from_config(&config).context("Failed to open portal storage")?;

    match cli::run(&portal, args.command).await {
        Ok(()) => Ok(()),
        // The auth gate has already told the user
        Err(PortalError::NotAuthenticated) => std::process::exit(2),
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.user_message());
            if e.requires_login() {
                TerminalNavigator.navigate(Route::Login);
            }
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins over the configured level; logs go to stderr or the
/// configured file
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
