//! Configuration management for the inventory ledger
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LEDGER_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{ExpirationPolicy, StockLevelPolicy};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Ledger behaviour
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Times a mutating call is retried after a concurrency conflict
    pub conflict_retries: u32,

    /// Area recorded on recipe consumptions when none is given
    pub default_area: String,

    /// Expiration classification thresholds
    pub expiration: ExpirationPolicy,

    /// Low-stock grading thresholds
    pub stock_levels: StockLevelPolicy,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("LEDGER_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let expiration = ExpirationPolicy::default();
        let levels = StockLevelPolicy::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("ledger.conflict_retries", 3)?
            .set_default("ledger.default_area", "PRODUCCION")?
            .set_default("ledger.expiration.critical_days", expiration.critical_days)?
            .set_default("ledger.expiration.high_days", expiration.high_days)?
            .set_default(
                "ledger.expiration.alert_window_days",
                expiration.alert_window_days,
            )?
            .set_default("ledger.stock_levels.critical", levels.critical.to_string())?
            .set_default("ledger.stock_levels.high", levels.high.to_string())?
            .set_default("ledger.stock_levels.medium", levels.medium.to_string())?
            .set_default(
                "ledger.stock_levels.default_minimum",
                levels.default_minimum.to_string(),
            )?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LEDGER_ prefix)
            .add_source(
                Environment::with_prefix("LEDGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/inventory_ledger".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            conflict_retries: 3,
            default_area: "PRODUCCION".to_string(),
            expiration: ExpirationPolicy::default(),
            stock_levels: StockLevelPolicy::default(),
        }
    }
}
