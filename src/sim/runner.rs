use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::aircraft::{Aircraft, AircraftModel, Controls};
use crate::sim::config::SimulationConfig;
use crate::sim::listener::FlightDataListener;
use crate::sim::log::LogBuffer;
use crate::sim::options::RunFlags;
use crate::sim::state::FlightState;
use crate::trim::TrimmedState;

/// Simulation lag beyond which the runner warns that it is falling behind
/// wall clock.
const MAX_LAG: Duration = Duration::from_millis(100);
/// Minimum spacing between lag warnings, to avoid log spam while
/// continuously lagging.
const LAG_WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Owns the real-time integration loop for one run.
///
/// Constructed fresh per run after trimming, loaded with listeners, then
/// consumed by `spawn`. The thread exits cooperatively once the running flag
/// is cleared and any in-flight tick completes; nobody is required to join it.
pub struct SimulationRunner {
    model: AircraftModel,
    aircraft: Aircraft,
    controls: Controls,
    trimmed: TrimmedState,
    tick_period: f64,
    /// Wall-clock pacing; disabled in analysis mode so the run completes as
    /// fast as possible.
    realtime: bool,
    end_time: Option<f64>,
    time: f64,
    flags: RunFlags,
    running: Arc<AtomicBool>,
    logs: LogBuffer,
    latest: Arc<Mutex<Option<FlightState>>>,
    listeners: Vec<Box<dyn FlightDataListener>>,
}

impl SimulationRunner {
    /// Analysis runs stop themselves after this much simulated time when the
    /// configuration does not say otherwise.
    const DEFAULT_ANALYSIS_DURATION_S: f64 = 60.0;

    pub fn new(config: &SimulationConfig, model: AircraftModel, trimmed: TrimmedState) -> Self {
        let aircraft = Aircraft::new(
            &model,
            trimmed.position(),
            trimmed.velocity(),
            trimmed.attitude(),
            trimmed.rates(),
        );

        let analysis = config.options.analysis_mode;
        let end_time = if analysis {
            Some(
                config
                    .run_duration_s
                    .unwrap_or(Self::DEFAULT_ANALYSIS_DURATION_S),
            )
        } else {
            config.run_duration_s
        };

        Self {
            controls: trimmed.controls(),
            aircraft,
            model,
            trimmed,
            tick_period: config.tick_period_s(),
            realtime: !analysis,
            end_time,
            time: 0.0,
            flags: RunFlags::new(),
            running: Arc::new(AtomicBool::new(true)),
            logs: LogBuffer::new(),
            latest: Arc::new(Mutex::new(None)),
            listeners: Vec::new(),
        }
    }

    /// Register a flight-data listener. Registration order is dispatch order;
    /// listeners cannot be removed once the run starts.
    pub fn add_flight_data_listener(&mut self, listener: Box<dyn FlightDataListener>) {
        self.listeners.push(listener);
    }

    /// Start the integration thread. The returned handle is the only way to
    /// observe or stop the run.
    pub fn spawn(self) -> io::Result<RunnerHandle> {
        let running = self.running.clone();
        let flags = self.flags.clone();
        let logs = self.logs.clone();
        let latest = self.latest.clone();

        let thread = thread::Builder::new()
            .name("sim-runner".to_string())
            .spawn(move || self.run())?;

        Ok(RunnerHandle {
            running,
            flags,
            logs,
            latest,
            thread,
        })
    }

    fn run(mut self) {
        info!(
            tick_rate_hz = 1.0 / self.tick_period,
            realtime = self.realtime,
            "simulation runner started"
        );

        let period = Duration::from_secs_f64(self.tick_period);
        let mut next_tick = Instant::now() + period;
        let mut last_lag_warn = Instant::now() - LAG_WARN_INTERVAL;

        while self.running.load(Ordering::Relaxed) {
            if self.flags.is_paused() {
                if self.flags.take_reset() {
                    self.reset();
                }
                // Unpaced runs never reach the pacing sleep below; idle here
                // instead of spinning on the flag locks
                if !self.realtime {
                    thread::sleep(period);
                }
            } else {
                self.step_once();

                if let Some(end) = self.end_time {
                    if self.time + 1e-9 >= end {
                        info!(time = self.time, "run duration reached, stopping");
                        self.running.store(false, Ordering::Relaxed);
                    }
                }
            }

            if self.realtime {
                let now = Instant::now();
                if next_tick > now {
                    thread::sleep(next_tick - now);
                } else {
                    let lag = now - next_tick;
                    if lag > MAX_LAG && now.duration_since(last_lag_warn) >= LAG_WARN_INTERVAL {
                        warn!(lag_ms = lag.as_millis() as u64, "integration lagging wall clock");
                        last_lag_warn = now;
                    }
                    // Resync rather than bursting to catch up
                    next_tick = now;
                }
                next_tick += period;
            }
        }

        info!(time = self.time, ticks = self.logs.len(), "simulation runner exiting");
    }

    fn step_once(&mut self) {
        self.aircraft.step(self.tick_period, &self.controls);
        self.time += self.tick_period;

        if !self.aircraft.is_finite() {
            error!(
                time = self.time,
                "integration diverged to a non-finite state, aborting run"
            );
            self.running.store(false, Ordering::Relaxed);
            return;
        }

        let snapshot = FlightState::capture(self.time, &self.aircraft, &self.controls);
        self.logs.append(snapshot.record());
        *self.latest.lock().unwrap() = Some(snapshot.clone());

        for listener in &self.listeners {
            if let Err(e) = listener.on_flight_data(&snapshot) {
                error!(listener = listener.name(), "flight data listener failed: {e}");
            }
        }
    }

    /// Reinitialize to the trimmed initial condition. Only reachable while
    /// paused, at most once per pause.
    fn reset(&mut self) {
        info!("resetting to trimmed initial conditions");
        self.aircraft = Aircraft::new(
            &self.model,
            self.trimmed.position(),
            self.trimmed.velocity(),
            self.trimmed.attitude(),
            self.trimmed.rates(),
        );
        self.controls = self.trimmed.controls();
        self.time = 0.0;
    }
}

/// Control surface of a spawned run: running flag, pause/reset flags and the
/// log buffer, all shared with the integration thread.
pub struct RunnerHandle {
    running: Arc<AtomicBool>,
    flags: RunFlags,
    logs: LogBuffer,
    latest: Arc<Mutex<Option<FlightState>>>,
    thread: JoinHandle<()>,
}

impl RunnerHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Cooperative stop: the thread observes the flag on its next tick and
    /// exits on its own. No join required.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn flags(&self) -> &RunFlags {
        &self.flags
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    /// Most recently computed snapshot, or `None` before the first tick.
    pub fn latest(&self) -> Option<FlightState> {
        self.latest.lock().unwrap().clone()
    }

    /// Wait for the integration thread to exit. Used by tests and batch runs;
    /// interactive teardown relies on the cooperative stop instead.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}
