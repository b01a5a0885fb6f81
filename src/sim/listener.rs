use thiserror::Error;

use crate::sim::state::FlightState;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Render failure: {0}")]
    Render(String),
    #[error("Listener failure: {0}")]
    Other(String),
}

/// Consumer of per-tick flight-state snapshots.
///
/// Listeners are registered before the runner thread starts and receive every
/// snapshot synchronously, in registration order. A returned error is logged
/// by the dispatcher and must not abort the tick; implementations must not
/// block for long or they degrade the real-time cadence.
pub trait FlightDataListener: Send {
    fn name(&self) -> &str;

    fn on_flight_data(&self, snapshot: &FlightState) -> Result<(), ListenerError>;
}
