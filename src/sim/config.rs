use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aircraft::{AircraftModel, ModelError};
use crate::sim::options::SimOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Invalid simulation configuration: {0}")]
    ValidationError(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Steady-flight condition the trimmer solves for and the runner resets to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Altitude above the reference plane [m].
    pub altitude_m: f64,
    /// True airspeed [m/s].
    pub airspeed_ms: f64,
    /// Initial heading [deg], clockwise from north.
    pub heading_deg: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            altitude_m: 1500.0,
            airspeed_ms: 55.0,
            heading_deg: 0.0,
        }
    }
}

/// Immutable-per-run snapshot of everything a simulation run needs.
///
/// Reloaded wholesale at the start of every run, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Optional aircraft model file; the built-in model is used when absent.
    pub aircraft_file: Option<PathBuf>,
    pub initial: InitialConditions,
    /// Integration rate [Hz].
    pub tick_rate_hz: f64,
    /// Analysis mode stops itself after this much simulated time [s].
    pub run_duration_s: Option<f64>,
    pub options: SimOptions,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            aircraft_file: None,
            initial: InitialConditions::default(),
            tick_rate_hz: 100.0,
            run_duration_s: None,
            options: SimOptions::default(),
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml_data = fs::read_to_string(path)?;
        let config: SimulationConfig = serde_yaml::from_str(&yaml_data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate_hz > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "tick rate must be positive, got {}",
                self.tick_rate_hz
            )));
        }
        if !(self.initial.airspeed_ms > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "initial airspeed must be positive, got {}",
                self.initial.airspeed_ms
            )));
        }
        if let Some(duration) = self.run_duration_s {
            if !(duration > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "run duration must be positive, got {duration}"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the aircraft model for this run.
    pub fn aircraft_model(&self) -> Result<AircraftModel, ConfigError> {
        match &self.aircraft_file {
            Some(path) => Ok(AircraftModel::from_yaml(path)?),
            None => Ok(AircraftModel::default()),
        }
    }

    pub fn tick_period_s(&self) -> f64 {
        1.0 / self.tick_rate_hz
    }
}
