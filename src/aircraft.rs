use std::fs;
use std::path::Path;

use aerso::density_models::ConstantDensity;
use aerso::types::*;
use aerso::wind_models::ConstantWind;
use aerso::{AeroBody, AeroEffect, AffectedBody, AirState, Body};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read aircraft model file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Invalid aircraft model: {0}")]
    ValidationError(String),
}

/// Control surface deflections and throttle setting for one tick.
///
/// Deflections are in radians, throttle is a 0..1 fraction. The field order
/// here fixes the input vector layout seen by the aero effectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub aileron: f64,
    pub elevator: f64,
    pub throttle: f64,
    pub rudder: f64,
}

impl Controls {
    pub const AILERON: usize = 0;
    pub const ELEVATOR: usize = 1;
    pub const THROTTLE: usize = 2;
    pub const RUDDER: usize = 3;

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.aileron, self.elevator, self.throttle, self.rudder]
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            aileron: 0.0,
            elevator: 0.0,
            throttle: 0.0,
            rudder: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragCoefficients {
    pub c_d_0: f64,
    pub c_d_alpha: f64,
    pub c_d_alpha2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideForceCoefficients {
    pub c_y_beta: f64,
    pub c_y_p: f64,
    pub c_y_r: f64,
    pub c_y_deltaa: f64,
    pub c_y_deltar: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiftCoefficients {
    pub c_l_0: f64,
    pub c_l_alpha: f64,
    pub c_l_q: f64,
    pub c_l_deltae: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollCoefficients {
    pub c_l_beta: f64,
    pub c_l_p: f64,
    pub c_l_r: f64,
    pub c_l_deltaa: f64,
    pub c_l_deltar: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchCoefficients {
    pub c_m_0: f64,
    pub c_m_alpha: f64,
    pub c_m_q: f64,
    pub c_m_deltae: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YawCoefficients {
    pub c_n_beta: f64,
    pub c_n_p: f64,
    pub c_n_r: f64,
    pub c_n_deltaa: f64,
    pub c_n_deltar: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeroCoefficients {
    pub drag: DragCoefficients,
    pub side_force: SideForceCoefficients,
    pub lift: LiftCoefficients,
    pub roll: RollCoefficients,
    pub pitch: PitchCoefficients,
    pub yaw: YawCoefficients,
}

/// Mass, geometry and aerodynamic description of one aircraft.
///
/// The default model is a Navion-class light single; a YAML file with the
/// same field layout can override it per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftModel {
    pub name: String,
    pub mass: f64,
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    pub ixz: f64,
    pub wing_area: f64,
    pub wing_span: f64,
    pub mac: f64,
    pub max_thrust: f64,
    pub coefficients: AeroCoefficients,
}

impl Default for AircraftModel {
    fn default() -> Self {
        Self {
            name: "navion".to_string(),
            mass: 1247.0,
            ixx: 1421.0,
            iyy: 4068.0,
            izz: 4787.0,
            ixz: 0.0,
            wing_area: 17.1,
            wing_span: 10.18,
            mac: 1.74,
            max_thrust: 3000.0,
            coefficients: AeroCoefficients {
                drag: DragCoefficients {
                    c_d_0: 0.05,
                    c_d_alpha: 0.33,
                    c_d_alpha2: 0.30,
                },
                side_force: SideForceCoefficients {
                    c_y_beta: -0.564,
                    c_y_p: 0.0,
                    c_y_r: 0.0,
                    c_y_deltaa: 0.0,
                    c_y_deltar: 0.157,
                },
                lift: LiftCoefficients {
                    c_l_0: 0.41,
                    c_l_alpha: 4.44,
                    c_l_q: 3.8,
                    c_l_deltae: 0.355,
                },
                roll: RollCoefficients {
                    c_l_beta: -0.074,
                    c_l_p: -0.410,
                    c_l_r: 0.107,
                    c_l_deltaa: 0.134,
                    c_l_deltar: 0.0107,
                },
                pitch: PitchCoefficients {
                    c_m_0: 0.04,
                    c_m_alpha: -0.683,
                    c_m_q: -9.96,
                    c_m_deltae: -0.923,
                },
                yaw: YawCoefficients {
                    c_n_beta: 0.071,
                    c_n_p: -0.0575,
                    c_n_r: -0.125,
                    c_n_deltaa: -0.0035,
                    c_n_deltar: -0.072,
                },
            },
        }
    }
}

impl AircraftModel {
    pub fn from_yaml(path: &Path) -> Result<Self, ModelError> {
        let yaml_data = fs::read_to_string(path)?;
        let model: AircraftModel = serde_yaml::from_str(&yaml_data)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.mass <= 0.0 {
            return Err(ModelError::ValidationError(format!(
                "mass must be positive, got {}",
                self.mass
            )));
        }
        if self.wing_area <= 0.0 || self.wing_span <= 0.0 || self.mac <= 0.0 {
            return Err(ModelError::ValidationError(
                "wing geometry must be positive".to_string(),
            ));
        }
        if self.ixx <= 0.0 || self.iyy <= 0.0 || self.izz <= 0.0 {
            return Err(ModelError::ValidationError(
                "principal inertias must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn inertia(&self) -> Matrix3 {
        Matrix3::new(
            self.ixx, 0.0, self.ixz,
            0.0, self.iyy, 0.0,
            self.ixz, 0.0, self.izz,
        )
    }
}

/// Aerodynamic force and moment build-up from the stability derivative tables.
struct AeroSurfaces {
    model: AircraftModel,
}

impl AeroEffect for AeroSurfaces {
    fn get_effect(&self, airstate: AirState, rates: Vector3, input: &Vec<f64>) -> (Force, Torque) {
        let c = &self.model.coefficients;

        let alpha = airstate.alpha;
        let beta = airstate.beta;
        // Guard the non-dimensional rates against the static case
        let airspeed = airstate.airspeed.max(1e-3);

        let tilde_p = (self.model.wing_span * rates[0]) / (2.0 * airspeed);
        let tilde_q = (self.model.mac * rates[1]) / (2.0 * airspeed);
        let tilde_r = (self.model.wing_span * rates[2]) / (2.0 * airspeed);

        let aileron = input[Controls::AILERON];
        let elevator = input[Controls::ELEVATOR];
        let rudder = input[Controls::RUDDER];

        let c_d = c.drag.c_d_0 + (c.drag.c_d_alpha * alpha) + (c.drag.c_d_alpha2 * alpha.powf(2.0));

        let c_y = (c.side_force.c_y_beta * beta)
            + (c.side_force.c_y_p * tilde_p)
            + (c.side_force.c_y_r * tilde_r)
            + (c.side_force.c_y_deltaa * aileron)
            + (c.side_force.c_y_deltar * rudder);

        let c_lift = c.lift.c_l_0
            + (c.lift.c_l_alpha * alpha)
            + (c.lift.c_l_q * tilde_q)
            + (c.lift.c_l_deltae * elevator);

        let c_roll = (c.roll.c_l_beta * beta)
            + (c.roll.c_l_p * tilde_p)
            + (c.roll.c_l_r * tilde_r)
            + (c.roll.c_l_deltaa * aileron)
            + (c.roll.c_l_deltar * rudder);

        let c_m = c.pitch.c_m_0
            + (c.pitch.c_m_alpha * alpha)
            + (c.pitch.c_m_q * tilde_q)
            + (c.pitch.c_m_deltae * elevator);

        let c_n = (c.yaw.c_n_beta * beta)
            + (c.yaw.c_n_p * tilde_p)
            + (c.yaw.c_n_r * tilde_r)
            + (c.yaw.c_n_deltaa * aileron)
            + (c.yaw.c_n_deltar * rudder);

        let qbar_s = airstate.q * self.model.wing_area;

        let drag = qbar_s * c_d;
        let side_force = qbar_s * c_y;
        let lift = qbar_s * c_lift;
        let rolling_moment = qbar_s * self.model.wing_span * c_roll;
        let pitching_moment = qbar_s * self.model.mac * c_m;
        let yawing_moment = qbar_s * self.model.wing_span * c_n;

        (
            Force::body(-drag, side_force, -lift),
            Torque::body(rolling_moment, pitching_moment, yawing_moment),
        )
    }
}

/// Thrust along the body x-axis, linear in throttle fraction.
struct PowerPlant {
    max_thrust: f64,
}

impl AeroEffect for PowerPlant {
    fn get_effect(&self, _airstate: AirState, _rates: Vector3, input: &Vec<f64>) -> (Force, Torque) {
        let throttle = input[Controls::THROTTLE].clamp(0.0, 1.0);
        (
            Force::body(self.max_thrust * throttle, 0.0, 0.0),
            Torque::body(0.0, 0.0, 0.0),
        )
    }
}

/// The 6DOF integration engine: an aerso rigid body with the aero surface
/// and power plant effectors attached. One tick advances it by `step`.
pub struct Aircraft {
    body: AffectedBody<Vec<f64>, f64, ConstantWind<f64>, ConstantDensity>,
}

impl Aircraft {
    pub fn new(
        model: &AircraftModel,
        initial_position: Vector3<f64>,
        initial_velocity: Vector3<f64>,
        initial_attitude: UnitQuaternion<f64>,
        initial_rates: Vector3<f64>,
    ) -> Self {
        let k_body = Body::new(
            model.mass,
            model.inertia(),
            initial_position,
            initial_velocity,
            initial_attitude,
            initial_rates,
        );

        let a_body = AeroBody::new(k_body);

        let body = AffectedBody {
            body: a_body,
            effectors: vec![
                Box::new(AeroSurfaces {
                    model: model.clone(),
                }),
                Box::new(PowerPlant {
                    max_thrust: model.max_thrust,
                }),
            ],
        };

        Self { body }
    }

    pub fn step(&mut self, dt: f64, controls: &Controls) {
        self.body.step(dt, &controls.to_vec());
    }

    /// True when every component of the state vector is still finite.
    pub fn is_finite(&self) -> bool {
        self.statevector().iter().all(|v| v.is_finite())
    }
}

impl StateView for Aircraft {
    fn position(&self) -> Vector3 {
        self.body.position()
    }

    fn velocity_in_frame(&self, frame: Frame) -> Vector3<f64> {
        self.body.velocity_in_frame(frame)
    }

    fn attitude(&self) -> UnitQuaternion<f64> {
        self.body.attitude()
    }

    fn rates_in_frame(&self, frame: Frame) -> Vector3<f64> {
        self.body.rates_in_frame(frame)
    }

    fn statevector(&self) -> StateVector<f64> {
        self.body.statevector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_valid() {
        assert!(AircraftModel::default().validate().is_ok());
    }

    #[test]
    fn negative_mass_rejected() {
        let model = AircraftModel {
            mass: -1.0,
            ..AircraftModel::default()
        };
        assert!(matches!(
            model.validate(),
            Err(ModelError::ValidationError(_))
        ));
    }

    #[test]
    fn controls_vector_layout() {
        let controls = Controls {
            aileron: 0.1,
            elevator: 0.2,
            throttle: 0.3,
            rudder: 0.4,
        };
        let v = controls.to_vec();
        assert_eq!(v[Controls::AILERON], 0.1);
        assert_eq!(v[Controls::ELEVATOR], 0.2);
        assert_eq!(v[Controls::THROTTLE], 0.3);
        assert_eq!(v[Controls::RUDDER], 0.4);
    }

    #[test]
    fn step_advances_state() {
        let model = AircraftModel::default();
        let mut aircraft = Aircraft::new(
            &model,
            Vector3::new(0.0, 0.0, -1000.0),
            Vector3::new(50.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            Vector3::zeros(),
        );
        let controls = Controls {
            throttle: 0.5,
            ..Controls::default()
        };
        for _ in 0..100 {
            aircraft.step(0.01, &controls);
        }
        assert!(aircraft.is_finite());
        assert!(aircraft.position()[0] > 0.0);
    }
}
