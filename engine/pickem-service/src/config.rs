//! Service configuration management
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! environment variables (a `.env` file is loaded first), then command-line
//! flags.

use anyhow::{Context, Result};
use clap::Parser;
use pick_engine::SeasonConfig;
use pick_store::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

/// Command-line flags
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "pickem")]
#[command(about = "Pick'em league pick validation and registration service")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Serve from an empty in-memory store instead of PostgreSQL
    #[arg(long)]
    pub in_memory: bool,

    /// Do not apply database migrations at startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// `None` runs against the in-memory store
    pub database: Option<DatabaseConfig>,
    pub season: SeasonConfig,
    pub run_migrations: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 4000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl ServerConfig {
    /// Address to bind; `host` may be an IP address or a resolvable name
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("Invalid server host: {}", self.host))?
            .next()
            .with_context(|| format!("Server host {} resolved to no address", self.host))
    }
}

/// Contents of the optional TOML file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    logging: LoggingConfig,
    database: Option<DatabaseConfig>,
    season: Option<SeasonConfig>,
}

/// Load configuration from files, environment variables and flags
pub fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    dotenv::dotenv().ok();
    load_with(cli, |key| std::env::var(key).ok())
}

/// Load configuration against an arbitrary variable source
pub fn load_with<F>(cli: &Cli, lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match &cli.config {
        Some(path) => load_from_file(path)?,
        None => FileConfig::default(),
    };

    let mut server = file.server;
    let mut logging = file.logging;

    if let Some(host) = lookup("HOST") {
        server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        server.port = port.trim().parse().with_context(|| format!("Invalid PORT: {}", port))?;
    }
    if let Some(level) = lookup("PICKEM_LOG_LEVEL") {
        logging.level = level;
    }
    if let Some(format) = lookup("PICKEM_LOG_FORMAT") {
        logging.format = format;
    }

    let season = if lookup("CURRENT_SEASON").is_some() {
        SeasonConfig::from_lookup(&lookup).context("Invalid season configuration")?
    } else {
        file.season.context("CURRENT_SEASON not set and no [season] section configured")?
    };

    let database = if cli.in_memory {
        None
    } else if lookup("DATABASE_URL").is_some() || lookup("PGHOST").is_some() {
        Some(DatabaseConfig::from_lookup(&lookup).context("Invalid database configuration")?)
    } else {
        let database = file
            .database
            .context("DATABASE_URL or PGHOST not set and no [database] section configured")?;
        Some(database)
    };

    // Command-line flags win
    if let Some(host) = &cli.host {
        server.host = host.clone();
    }
    if let Some(port) = cli.port {
        server.port = port;
    }
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        logging.format = format.clone();
    }

    let config = ServiceConfig {
        server,
        logging,
        database,
        season,
        run_migrations: !cli.skip_migrations,
    };
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML file
fn load_from_file(path: &std::path::Path) -> Result<FileConfig> {
    tracing::debug!("Loading configuration from file: {:?}", path);
    config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()))
        .build()
        .and_then(|settings| settings.try_deserialize::<FileConfig>())
        .with_context(|| format!("Failed to read configuration file {:?}", path))
}

/// Validate configuration
fn validate_config(config: &ServiceConfig) -> Result<()> {
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.server.port == 0 {
        return Err(anyhow::anyhow!("Invalid server port: {}", config.server.port));
    }
    config.server.socket_addr()?;

    config.season.validate().context("Invalid season configuration")?;

    if let Some(database) = &config.database {
        database.validate().context("Invalid database configuration")?;
    }

    Ok(())
}
