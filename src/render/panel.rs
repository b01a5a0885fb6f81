use std::sync::{Arc, Mutex};

use crate::sim::{FlightDataListener, FlightState, ListenerError};

const M_TO_FT: f64 = 3.28084;
const MS_TO_KT: f64 = 1.94384;

/// Instrument readings in cockpit units, derived from the latest snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanelReadings {
    pub airspeed_kt: f64,
    pub altitude_ft: f64,
    pub vertical_speed_fpm: f64,
    pub heading_deg: f64,
    pub roll_deg: f64,
    pub pitch_deg: f64,
}

#[derive(Debug, Default)]
struct PanelState {
    readings: PanelReadings,
    /// (time, altitude_ft) of the previous tick, for the VSI derivative.
    previous: Option<(f64, f64)>,
}

/// Instrument-panel flight-data listener. The GUI reads `readings()` at any
/// time; updates land synchronously on the integration thread and must stay
/// cheap.
#[derive(Debug, Clone, Default)]
pub struct InstrumentPanel {
    inner: Arc<Mutex<PanelState>>,
}

impl InstrumentPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readings(&self) -> PanelReadings {
        self.inner.lock().unwrap().readings
    }
}

impl FlightDataListener for InstrumentPanel {
    fn name(&self) -> &str {
        "instrument-panel"
    }

    fn on_flight_data(&self, snapshot: &FlightState) -> Result<(), ListenerError> {
        let (roll, pitch, heading) = snapshot.euler_angles();
        let altitude_ft = snapshot.altitude() * M_TO_FT;

        let mut state = self.inner.lock().unwrap();

        let vertical_speed_fpm = match state.previous {
            Some((prev_time, prev_alt)) if snapshot.time > prev_time => {
                (altitude_ft - prev_alt) / (snapshot.time - prev_time) * 60.0
            }
            _ => 0.0,
        };
        state.previous = Some((snapshot.time, altitude_ft));

        state.readings = PanelReadings {
            airspeed_kt: snapshot.airspeed() * MS_TO_KT,
            altitude_ft,
            vertical_speed_fpm,
            heading_deg: heading.to_degrees().rem_euclid(360.0),
            roll_deg: roll.to_degrees(),
            pitch_deg: pitch.to_degrees(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{Aircraft, AircraftModel, Controls};
    use aerso::types::{UnitQuaternion, Vector3};
    use approx::assert_relative_eq;

    fn snapshot_at(time: f64, altitude_m: f64) -> FlightState {
        let model = AircraftModel::default();
        let aircraft = Aircraft::new(
            &model,
            Vector3::new(0.0, 0.0, -altitude_m),
            Vector3::new(51.44, 0.0, 0.0),
            UnitQuaternion::identity(),
            Vector3::zeros(),
        );
        FlightState::capture(time, &aircraft, &Controls::default())
    }

    #[test]
    fn converts_to_cockpit_units() {
        let panel = InstrumentPanel::new();
        panel.on_flight_data(&snapshot_at(0.0, 1000.0)).unwrap();

        let readings = panel.readings();
        assert_relative_eq!(readings.altitude_ft, 3280.84, epsilon = 0.01);
        // 51.44 m/s is very nearly 100 kt
        assert_relative_eq!(readings.airspeed_kt, 100.0, epsilon = 0.1);
        assert_relative_eq!(readings.vertical_speed_fpm, 0.0);
    }

    #[test]
    fn vertical_speed_from_consecutive_ticks() {
        let panel = InstrumentPanel::new();
        panel.on_flight_data(&snapshot_at(0.0, 1000.0)).unwrap();
        // 10 m climb over 1 s = 600 m/min = 1968.5 fpm
        panel.on_flight_data(&snapshot_at(1.0, 1010.0)).unwrap();

        let readings = panel.readings();
        assert_relative_eq!(readings.vertical_speed_fpm, 10.0 * M_TO_FT * 60.0, epsilon = 0.01);
    }
}
