use aerso::types::{UnitQuaternion, Vector3};
use aerso::types::StateView;
use argmin::core::{CostFunction, Error};

use crate::aircraft::{Aircraft, AircraftModel, Controls};

/// Cost of holding a [pitch, elevator, throttle] candidate fixed over a short
/// rollout: integrated along-track airspeed error plus climb rate, ignoring
/// the initial transient.
#[derive(Clone)]
pub(crate) struct TrimCost {
    pub model: AircraftModel,
    pub altitude: f64,
    pub airspeed: f64,
    pub heading: f64,
    pub horizon_s: f64,
    pub tick_rate: f64,
}

impl TrimCost {
    const SETTLE_TIME_S: f64 = 0.1;
    /// Cost assigned to candidates that diverge before the horizon ends.
    const DIVERGED_COST: f64 = 1e9;

    pub fn eval(&self, u: &[f64]) -> f64 {
        let dt = 1.0 / self.tick_rate;

        // World-frame velocity must point along the heading, or the rollout
        // starts in a sideslip the candidate cannot recover from
        let (sin_h, cos_h) = self.heading.sin_cos();
        let mut aircraft = Aircraft::new(
            &self.model,
            Vector3::new(0.0, 0.0, -self.altitude),
            Vector3::new(self.airspeed * cos_h, self.airspeed * sin_h, 0.0),
            UnitQuaternion::from_euler_angles(0.0, u[0], self.heading),
            Vector3::zeros(),
        );

        let controls = Controls {
            aileron: 0.0,
            elevator: u[1],
            throttle: u[2],
            rudder: 0.0,
        };

        let steps = (self.horizon_s * self.tick_rate) as usize;
        let mut total_cost = 0.0;
        let mut time = 0.0;

        for _ in 0..steps {
            aircraft.step(dt, &controls);
            time += dt;

            if time > Self::SETTLE_TIME_S {
                let velocity = aircraft.velocity();
                let along_track = velocity[0] * cos_h + velocity[1] * sin_h;
                let current_cost =
                    (along_track - self.airspeed).powf(2.0) + velocity[2].powf(2.0);
                total_cost += current_cost * dt;
            }
        }

        if !aircraft.is_finite() || !total_cost.is_finite() {
            return Self::DIVERGED_COST;
        }
        total_cost
    }
}

impl CostFunction for TrimCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.eval(param))
    }
}
