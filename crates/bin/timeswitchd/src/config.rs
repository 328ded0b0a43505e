//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `timeswitch.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use timeswitch_app::ports::Coordinates;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Observer position for solar events.
    pub location: LocationConfig,
    /// State store settings.
    pub state: StateConfig,
    /// Command processing tuning.
    pub commands: CommandsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
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

/// Observer position in decimal degrees.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// JSON file the state store is loaded from and saved to.
    pub snapshot: PathBuf,
    /// Schedules live in `<prefix><n>.data` with their enabled flag in
    /// `<prefix><n>.enabled`.
    pub schedule_prefix: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Delay before retrying a command that found the processor busy.
    pub retry_delay_ms: u64,
    /// Delay before a one-time trigger dated in the past is deleted.
    pub one_time_grace_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `timeswitch.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("timeswitch.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
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

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("TIMESWITCH_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("TIMESWITCH_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("TIMESWITCH_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(latitude) = var("TIMESWITCH_LATITUDE").and_then(|val| val.parse().ok()) {
            self.location.latitude = latitude;
        }
        if let Some(longitude) = var("TIMESWITCH_LONGITUDE").and_then(|val| val.parse().ok()) {
            self.location.longitude = longitude;
        }
        if let Some(val) = var("TIMESWITCH_STATE_FILE") {
            self.state.snapshot = PathBuf::from(val);
        }
        if let Some(val) = var("TIMESWITCH_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.location.latitude) {
            return Err(ConfigError::Validation(format!(
                "latitude {} is outside [-90, 90]",
                self.location.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.location.longitude) {
            return Err(ConfigError::Validation(format!(
                "longitude {} is outside [-180, 180]",
                self.location.longitude
            )));
        }
        if self.state.schedule_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "schedule prefix must not be empty".to_string(),
            ));
        }
        if self.commands.retry_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "retry delay must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.location.latitude,
            longitude: self.location.longitude,
        }
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.commands.retry_delay_ms)
    }

    #[must_use]
    pub fn one_time_grace(&self) -> Duration {
        Duration::from_millis(self.commands.one_time_grace_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Berlin
        Self {
            latitude: 52.52,
            longitude: 13.405,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("timeswitch-state.json"),
            schedule_prefix: "time-switch.0.onoff.".to_string(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 50,
            one_time_grace_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "timeswitchd=info,timeswitch=info,tower_http=debug".to_string(),
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
