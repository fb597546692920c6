//! Upstream registrar.
//!
//! Registers this host as a node of a gateway upstream, serves the health
//! route and deregisters on SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;

use upstream_registrar::{load_config, observability, Registration};

#[derive(Parser)]
#[command(name = "upstream-registrar")]
#[command(about = "Register a service instance with a gateway upstream", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "registrar.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    observability::logging::init(&config.observability.log_level)?;

    tracing::info!(
        config = %cli.config.display(),
        service = %config.name,
        admin_api = %config.admin_api,
        "upstream-registrar v0.1.0 starting"
    );

    let registration = Registration::new(config)?;
    if let Err(error) = registration.start().await {
        tracing::error!(%error, category = %error.category(), "Registration failed to start");
        return Err(error.into());
    }

    registration.stopped().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
