#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sixdof::{
    Channel, FlightDataListener, FlightState, ListenerError, LogRecord, SimOptions,
    SimulationConfig, TrimmedState,
};

/// Normal-mode configuration used across the integration tests.
pub fn test_config() -> SimulationConfig {
    SimulationConfig {
        tick_rate_hz: 100.0,
        options: SimOptions {
            analysis_mode: false,
            console_display: false,
            otw_frame_rate_hz: 30.0,
            console_refresh_ms: 50,
        },
        ..SimulationConfig::default()
    }
}

/// A plausible trimmed condition, bypassing the solver for runner-level tests.
pub fn test_trimmed() -> TrimmedState {
    TrimmedState {
        pitch: 0.03,
        elevator: -0.05,
        throttle: 0.55,
        altitude_m: 1500.0,
        airspeed_ms: 55.0,
        heading_rad: 0.0,
        cost: 0.0,
    }
}

/// Listener that counts delivered snapshots.
pub struct CountingListener {
    pub ticks: Arc<AtomicUsize>,
}

impl CountingListener {
    pub fn new() -> Self {
        Self {
            ticks: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FlightDataListener for CountingListener {
    fn name(&self) -> &str {
        "counting"
    }

    fn on_flight_data(&self, _snapshot: &FlightState) -> Result<(), ListenerError> {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Listener that fails on every dispatch.
pub struct FailingListener;

impl FlightDataListener for FailingListener {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_flight_data(&self, _snapshot: &FlightState) -> Result<(), ListenerError> {
        Err(ListenerError::Other("deliberate test failure".to_string()))
    }
}

/// Time column of a record sequence.
pub fn times(records: &[LogRecord]) -> Vec<f64> {
    records.iter().map(|r| r.get(Channel::Time)).collect()
}

/// Number of backwards jumps in the time column; each reset restarts the
/// clock, so this counts applied resets.
pub fn time_restarts(records: &[LogRecord]) -> usize {
    times(records).windows(2).filter(|w| w[1] < w[0]).count()
}
