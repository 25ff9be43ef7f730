//! Configuration loading and typed config structures for FlightSim.
//!
//! The configuration lives in `flightsim-config.yaml` in the working
//! directory. Every field has a default, so a missing file or an empty
//! document yields a runnable configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level FlightSim configuration.
///
/// Mirrors the structure of `flightsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FlightSimConfig {
    /// Listening address.
    #[serde(default)]
    pub server: ListenConfig,

    /// Streaming cadence and delivery deadline.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Flight model parameters.
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FlightSimConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listen address:
    /// - `FLIGHTSIM_HOST` overrides `server.host`
    /// - `FLIGHTSIM_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that would make the streaming loop misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "stream.tick_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.stream.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "stream.send_timeout_ms must be at least 1".to_owned(),
            });
        }
        check_probability(
            "simulation.phase_advance_probability",
            self.simulation.phase_advance_probability,
        )?;
        check_probability(
            "simulation.error_probability",
            self.simulation.error_probability,
        )?;
        if !self.simulation.origin_latitude.is_finite()
            || !self.simulation.origin_longitude.is_finite()
        {
            return Err(ConfigError::Invalid {
                reason: "simulation origin must be finite".to_owned(),
            });
        }
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: format!("{name} must be within 0.0..=1.0, got {value}"),
        })
    }
}

/// Address the telemetry server binds to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Host address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ListenConfig {
    /// Override the listen address from an environment-style lookup.
    ///
    /// `lookup` is called with `FLIGHTSIM_HOST` and `FLIGHTSIM_PORT`;
    /// [`FlightSimConfig::from_file`] passes the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `FLIGHTSIM_PORT` is not a port
    /// number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FLIGHTSIM_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("FLIGHTSIM_PORT") {
            self.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                reason: format!("FLIGHTSIM_PORT={port:?} is not a port number: {e}"),
            })?;
        }
        Ok(())
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Streaming cadence for every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Milliseconds between samples on one connection.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Milliseconds a single send may take before the session is dropped.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl StreamConfig {
    /// Interval between samples as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Per-send deadline as a [`Duration`].
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

/// Flight model parameters.
///
/// Step sizes (climb, descent, drift, sensor ranges) are fixed constants
/// in [`crate::engine`]; only the starting point, the event probabilities
/// and the seed are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SimulationParams {
    /// Seed for reproducible runs. `None` draws from OS entropy.
    ///
    /// Each session derives its own stream from this seed, so the run is
    /// only reproducible for a fixed connection order.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Starting latitude in degrees.
    #[serde(default = "default_origin_latitude")]
    pub origin_latitude: f64,

    /// Starting longitude in degrees.
    #[serde(default = "default_origin_longitude")]
    pub origin_longitude: f64,

    /// Chance per tick that the launch phase moves forward.
    #[serde(default = "default_phase_advance_probability")]
    pub phase_advance_probability: f64,

    /// Chance per tick that a non-zero error code is reported.
    #[serde(default = "default_error_probability")]
    pub error_probability: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: None,
            origin_latitude: default_origin_latitude(),
            origin_longitude: default_origin_longitude(),
            phase_advance_probability: default_phase_advance_probability(),
            error_probability: default_error_probability(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_send_timeout_ms() -> u64 {
    2_000
}

const fn default_origin_latitude() -> f64 {
    -7.7714
}

const fn default_origin_longitude() -> f64 {
    110.3775
}

const fn default_phase_advance_probability() -> f64 {
    0.05
}

const fn default_error_probability() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "info".to_owned()
}
