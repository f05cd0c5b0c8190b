//! Solar Market CLI server
//!
//! ```sh
//! solar-market-service                                   # ~/.config/solar-market/config.toml
//! solar-market-service --config /etc/solar-market/config.toml
//! solar-market-service --api-port 8081 --log-level debug
//! solar-market-service --init                            # write a default config file
//! solar-market-service --check                           # validate and exit
//! solar-market-service --in-memory --no-admin            # throwaway instance
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info, warn};

use solar_market::config::AppConfig;
use solar_market::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "solar-market-service",
    version,
    about = "Marketplace backend for PV installations, energy certificates and grid tariffs",
    long_about = "REST API connecting households, installers, energy consultants \
                  and grid operators.\n\n\
                  Default config: ~/.config/solar-market/config.toml"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "SOLAR_MARKET_CONFIG")]
    config: Option<PathBuf>,

    /// REST API port, overrides `server.api_port`
    #[arg(long)]
    api_port: Option<u16>,

    /// Log level, overrides `logging.level`
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit
    #[arg(long, conflicts_with = "init")]
    check: bool,

    /// Write a default configuration file (if none exists) and exit
    #[arg(long)]
    init: bool,

    /// Do not run database migrations
    #[arg(long)]
    no_migrate: bool,

    /// Do not create the default admin account
    #[arg(long)]
    no_admin: bool,

    /// Keep all data in memory
    #[arg(long)]
    in_memory: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.api_port {
            config.server.api_port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let path = cli
        .config
        .clone()
        .unwrap_or_else(solar_market::default_config_path);

    if cli.init {
        return init_config(&path);
    }
    if cli.check {
        return check_config(&cli, &path);
    }
    serve(&cli, &path).await
}

fn init_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    AppConfig::default().save(path)?;
    println!("✅ Wrote default config to {}", path.display());
    println!("   Change security.jwt_secret and admin.password before going live.");
    Ok(())
}

fn check_config(cli: &Cli, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load(path).inspect_err(|e| eprintln!("❌ {}", e))?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    println!("✅ Configuration is valid");
    println!("   Config file : {}", path.display());
    println!("   API address : {}", config.api_address());
    println!("   Database    : {}", config.database.url);
    println!("   Log level   : {} ({})", config.logging.level, config.logging.format);
    if config.billing.enabled {
        println!(
            "   Billing     : every {}h, {} kWh/year, due after {} days",
            config.billing.interval_hours,
            config.billing.assumed_annual_consumption_kwh,
            config.billing.invoice_due_days
        );
    } else {
        println!("   Billing     : off");
    }
    Ok(())
}

async fn serve(cli: &Cli, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = AppConfig::load(path);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    cli.apply_overrides(&mut config);

    // tracing needs the final log level, so it starts after the overrides
    init_tracing(&config);
    match &loaded {
        Ok(_) => info!("Configuration loaded from {}", path.display()),
        Err(e) => {
            error!("Cannot use {}: {}", path.display(), e);
            warn!("Falling back to built-in defaults");
        }
    }
    if cli.api_port.is_some() || cli.log_level.is_some() {
        info!(
            api_port = config.server.api_port,
            log_level = %config.logging.level,
            "Command line overrides applied"
        );
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        create_default_admin: !cli.no_admin,
        in_memory: cli.in_memory,
    })
    .await?;
    handle.install_signal_handler();
    info!(port = handle.api_port, "Press Ctrl+C to stop");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}
