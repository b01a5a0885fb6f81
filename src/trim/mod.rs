mod cost;

use aerso::types::{UnitQuaternion, Vector3};
use argmin::core::observers::ObserverMode;
use argmin::core::{Executor, State};
use argmin::solver::neldermead::NelderMead;
use argmin_observer_slog::SlogLogger;
use thiserror::Error;
use tracing::{debug, info};

use crate::aircraft::{AircraftModel, Controls};
use crate::sim::SimulationConfig;
use cost::TrimCost;

#[derive(Error, Debug)]
pub enum TrimError {
    #[error("Trim solver failed: {0}")]
    Solver(#[from] argmin::core::Error),
    #[error("Trim solver returned no solution")]
    NoSolution,
    #[error("Trim did not converge, residual cost {cost:.3}")]
    NotConverged { cost: f64 },
}

/// Steady-state initial condition computed before a run. The runner builds
/// its aircraft from this, both at start and on every in-pause reset.
#[derive(Debug, Clone, Copy)]
pub struct TrimmedState {
    pub pitch: f64,
    pub elevator: f64,
    pub throttle: f64,
    pub altitude_m: f64,
    pub airspeed_ms: f64,
    pub heading_rad: f64,
    pub cost: f64,
}

impl TrimmedState {
    pub fn controls(&self) -> Controls {
        Controls {
            aileron: 0.0,
            elevator: self.elevator,
            throttle: self.throttle,
            rudder: 0.0,
        }
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -self.altitude_m)
    }

    /// World-frame velocity along the trimmed heading.
    pub fn velocity(&self) -> Vector3<f64> {
        let (sin_h, cos_h) = self.heading_rad.sin_cos();
        Vector3::new(
            self.airspeed_ms * cos_h,
            self.airspeed_ms * sin_h,
            0.0,
        )
    }

    pub fn attitude(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(0.0, self.pitch, self.heading_rad)
    }

    pub fn rates(&self) -> Vector3<f64> {
        Vector3::zeros()
    }
}

struct TrimBudget {
    horizon_s: f64,
    max_iters: u64,
    /// Residual rollout cost above which the solution is rejected.
    cost_bound: f64,
}

impl TrimBudget {
    fn for_mode(fast: bool) -> Self {
        if fast {
            Self {
                horizon_s: 2.0,
                max_iters: 40,
                cost_bound: 200.0,
            }
        } else {
            Self {
                horizon_s: 10.0,
                max_iters: 200,
                cost_bound: 100.0,
            }
        }
    }
}

/// Initial simplex around the guess, perturbing each axis in turn.
fn build_simplex(init: &[f64]) -> Vec<Vec<f64>> {
    let n = init.len();
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(init.to_vec());

    for i in 0..n {
        let mut vertex = init.to_vec();
        let perturbation = if vertex[i].abs() > 1e-10 {
            0.1 * vertex[i].abs()
        } else {
            0.005
        };
        vertex[i] += perturbation;
        simplex.push(vertex);
    }
    simplex
}

/// Compute a steady-state [pitch, elevator, throttle] for the configured
/// flight condition. Blocking by design: the caller must not spawn any run
/// thread until this returns. `fast` trades accuracy for wall time.
pub fn trim(
    config: &SimulationConfig,
    model: &AircraftModel,
    fast: bool,
) -> Result<TrimmedState, TrimError> {
    let budget = TrimBudget::for_mode(fast);
    let heading_rad = config.initial.heading_deg.to_radians();

    let cost = TrimCost {
        model: model.clone(),
        altitude: config.initial.altitude_m,
        airspeed: config.initial.airspeed_ms,
        heading: heading_rad,
        horizon_s: budget.horizon_s,
        tick_rate: config.tick_rate_hz,
    };

    debug!(
        aircraft = model.name.as_str(),
        airspeed = config.initial.airspeed_ms,
        altitude = config.initial.altitude_m,
        fast,
        "trimming"
    );

    // Initial guess: slight nose-up, neutral elevator, mid throttle
    let init = vec![2.0_f64.to_radians(), 0.0, 0.5];
    let solver = NelderMead::new(build_simplex(&init)).with_sd_tolerance(1e-3)?;

    let executor = Executor::new(cost, solver).configure(|state| state.max_iters(budget.max_iters));
    let executor = if fast {
        executor
    } else {
        executor.add_observer(SlogLogger::term(), ObserverMode::NewBest)
    };

    let res = executor.run()?;
    let best_cost = res.state().get_best_cost();
    let best = res
        .state()
        .get_best_param()
        .cloned()
        .ok_or(TrimError::NoSolution)?;

    if !best_cost.is_finite() || best_cost > budget.cost_bound {
        return Err(TrimError::NotConverged { cost: best_cost });
    }

    info!(
        pitch_deg = best[0].to_degrees(),
        elevator = best[1],
        throttle = best[2],
        cost = best_cost,
        "trim complete"
    );

    Ok(TrimmedState {
        pitch: best[0],
        elevator: best[1],
        // The power plant saturates outside 0..1; report the effective setting
        throttle: best[2].clamp(0.0, 1.0),
        altitude_m: config.initial.altitude_m,
        airspeed_ms: config.initial.airspeed_ms,
        heading_rad,
        cost: best_cost,
    })
}
