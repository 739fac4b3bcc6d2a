//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `homewatch.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Event bus and dispatch loop tuning.
    pub bus: BusConfig,
    /// Plugin toggles.
    pub plugins: PluginsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Maximum number of queued events before producers are refused.
    pub capacity: usize,
    /// Seconds between `CYCLE` ticks.
    pub cycle_interval_secs: u64,
    /// Upper bound on an idle wait before the loop re-checks for shutdown.
    pub poll_interval_ms: u64,
    /// Time budget for draining queued events on shutdown.
    pub drain_grace_ms: u64,
}

/// Per-plugin toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Enable the simulator plugin.
    pub simulator_enabled: bool,
}

impl Config {
    /// Load configuration from `homewatch.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, if an
    /// environment override cannot be parsed, or if the resulting values are
    /// out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homewatch.toml")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("HOMEWATCH_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("HOMEWATCH_PORT") {
            self.server.port = parse_override("HOMEWATCH_PORT", &val)?;
        }
        if let Ok(val) = std::env::var("HOMEWATCH_BIND") {
            let (host, port) = split_bind(&val)?;
            self.server.host = host;
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("HOMEWATCH_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("HOMEWATCH_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("HOMEWATCH_CYCLE_INTERVAL_SECS") {
            self.bus.cycle_interval_secs =
                parse_override("HOMEWATCH_CYCLE_INTERVAL_SECS", &val)?;
        }
        if let Ok(val) = std::env::var("HOMEWATCH_BUS_CAPACITY") {
            self.bus.capacity = parse_override("HOMEWATCH_BUS_CAPACITY", &val)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::Validation(
                "bus capacity must be non-zero".to_string(),
            ));
        }
        if self.bus.cycle_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "cycle interval must be non-zero".to_string(),
            ));
        }
        if !(1..=1000).contains(&self.bus.poll_interval_ms) {
            return Err(ConfigError::Validation(
                "poll interval must be between 1 and 1000 ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl BusConfig {
    #[must_use]
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }
}

/// Parse the raw value of environment variable `key`.
fn parse_override<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::Validation(format!("{key}={raw} is not a valid value")))
}

/// Split a `host:port` bind address.
fn split_bind(raw: &str) -> Result<(String, u16), ConfigError> {
    let (host, port) = raw.rsplit_once(':').ok_or_else(|| {
        ConfigError::Validation(format!("HOMEWATCH_BIND={raw} is not host:port"))
    })?;
    Ok((host.to_string(), parse_override("HOMEWATCH_BIND", port)?))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:homewatch.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homewatchd=info,homewatch_app=info,homewatch_adapter_http_axum=info,tower_http=debug"
                .to_string(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            cycle_interval_secs: 60,
            poll_interval_ms: 500,
            drain_grace_ms: 2000,
        }
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            simulator_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
