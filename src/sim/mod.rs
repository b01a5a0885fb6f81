mod config;
mod listener;
mod log;
mod options;
mod runner;
mod state;

pub use config::{ConfigError, InitialConditions, SimulationConfig};
pub use listener::{FlightDataListener, ListenerError};
pub use log::LogBuffer;
pub use options::{RunFlags, SimOptions};
pub use runner::{RunnerHandle, SimulationRunner};
pub use state::{Channel, FlightState, LogRecord};
