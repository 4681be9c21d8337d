//! Configuration loading and typed config structures.
//!
//! The server reads `fleetlink-config.yaml` from its working directory.
//! Every field has a default, so a missing file or a partial file is
//! valid. A handful of environment variables override the file after
//! parsing:
//!
//! - `FLEETLINK_HOST` overrides `network.host`
//! - `FLEETLINK_SESSION_PORT` overrides `network.session_port`
//! - `FLEETLINK_OBSERVER_PORT` overrides `network.observer_port`
//! - `FLEETLINK_TICK_INTERVAL_MS` overrides `simulation.tick_interval_ms`

use std::collections::BTreeSet;
use std::path::Path;

use fleetlink_types::{Capabilities, Position, VehicleId};
use serde::Deserialize;

use crate::broadcast::DEFAULT_BROADCAST_CAPACITY;
use crate::vehicle::Vehicle;

/// Shortest accepted tick period.
const MIN_TICK_INTERVAL_MS: u64 = 10;

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

    /// The configuration parsed but is not usable.
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

/// Top-level configuration, mirroring `fleetlink-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FleetConfig {
    /// Tick loop settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Listener addresses and channel sizes.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Initial fleet.
    #[serde(default = "default_fleet")]
    pub fleet: Vec<VehicleConfig>,
}

impl FleetConfig {
    /// Load configuration from a YAML file, apply environment overrides
    /// and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without overrides or
    /// validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment-style overrides. `lookup` returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric override does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FLEETLINK_HOST") {
            self.network.host = host;
        }
        if let Some(port) = lookup("FLEETLINK_SESSION_PORT") {
            self.network.session_port = parse_override("FLEETLINK_SESSION_PORT", &port)?;
        }
        if let Some(port) = lookup("FLEETLINK_OBSERVER_PORT") {
            self.network.observer_port = parse_override("FLEETLINK_OBSERVER_PORT", &port)?;
        }
        if let Some(ms) = lookup("FLEETLINK_TICK_INTERVAL_MS") {
            self.simulation.tick_interval_ms = parse_override("FLEETLINK_TICK_INTERVAL_MS", &ms)?;
        }
        Ok(())
    }

    /// Check the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(invalid(format!(
                "simulation.tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
            )));
        }
        if !self.simulation.default_range.is_finite() || self.simulation.default_range < 0.0 {
            return Err(invalid(
                "simulation.default_range must be a non-negative number",
            ));
        }
        if self.network.broadcast_capacity == 0 {
            return Err(invalid("network.broadcast_capacity must be at least 1"));
        }
        if self.fleet.is_empty() {
            return Err(invalid("fleet must contain at least one vehicle"));
        }

        let mut seen = BTreeSet::new();
        for vehicle in &self.fleet {
            if !seen.insert(vehicle.id) {
                return Err(invalid(format!("duplicate vehicle id {}", vehicle.id)));
            }
            if !(vehicle.x.is_finite() && vehicle.y.is_finite()) {
                return Err(invalid(format!(
                    "vehicle {} has a non-finite position",
                    vehicle.id
                )));
            }
            if let Some(range) = vehicle.range
                && (!range.is_finite() || range < 0.0)
            {
                return Err(invalid(format!(
                    "vehicle {} has an invalid range {range}",
                    vehicle.id
                )));
            }
        }
        Ok(())
    }

    /// Build the initial vehicles. Vehicles without an explicit range use
    /// `simulation.default_range`.
    pub fn build_vehicles(&self) -> Vec<Vehicle> {
        self.fleet
            .iter()
            .map(|v| {
                Vehicle::new(
                    v.id,
                    Position::new(v.x, v.y),
                    Capabilities {
                        own_uplink: v.own_uplink,
                        cellular: v.cellular,
                    },
                    v.range.unwrap_or(self.simulation.default_range),
                )
            })
            .collect()
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            network: NetworkConfig::default(),
            fleet: default_fleet(),
        }
    }
}

/// Tick loop configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default)]
    pub max_ticks: u64,

    /// DSRC range for vehicles that do not set their own.
    #[serde(default = "default_range")]
    pub default_range: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            default_range: default_range(),
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Address both listeners bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port of the controller session listener.
    #[serde(default = "default_session_port")]
    pub session_port: u16,

    /// TCP port of the observer HTTP server.
    #[serde(default = "default_observer_port")]
    pub observer_port: u16,

    /// Snapshots a subscriber may fall behind before skipping ahead.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            session_port: default_session_port(),
            observer_port: default_observer_port(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// One vehicle of the initial fleet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleConfig {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// Initial horizontal coordinate.
    pub x: f64,
    /// Initial vertical coordinate.
    pub y: f64,
    /// Has its own free uplink.
    #[serde(default)]
    pub own_uplink: bool,
    /// Can fall back to cellular.
    #[serde(default)]
    pub cellular: bool,
    /// DSRC range override.
    #[serde(default)]
    pub range: Option<f64>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_range() -> f64 {
    30.0
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_session_port() -> u16 {
    65432
}

const fn default_observer_port() -> u16 {
    8080
}

const fn default_broadcast_capacity() -> usize {
    DEFAULT_BROADCAST_CAPACITY
}

/// The six-vehicle demonstration fleet: two clusters, each with one
/// provider, and vehicle 4 without cellular.
fn default_fleet() -> Vec<VehicleConfig> {
    const LAYOUT: [(u32, f64, f64, bool, bool); 6] = [
        (0, 0.0, 0.0, false, true),
        (1, 10.0, 0.0, true, true),
        (2, 20.0, 0.0, false, true),
        (3, 100.0, 100.0, false, true),
        (4, 110.0, 100.0, false, false),
        (5, 120.0, 100.0, true, true),
    ];
    LAYOUT
        .iter()
        .map(|&(id, x, y, own_uplink, cellular)| VehicleConfig {
            id: VehicleId(id),
            x,
            y,
            own_uplink,
            cellular,
            range: None,
        })
        .collect()
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| invalid(format!("invalid {key}: {e}")))
}
