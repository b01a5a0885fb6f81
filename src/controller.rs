use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::aircraft::AircraftModel;
use crate::output::{save_csv, ConsoleView, OutputError, PlotWindow};
use crate::render::{
    DisplaySurface, InstrumentPanel, NullSurface, OtwHandle, OtwLink, OtwRenderer, RenderError,
};
use crate::sim::{ConfigError, LogRecord, RunnerHandle, SimulationConfig, SimulationRunner};
use crate::trim::{self, TrimError, TrimmedState};

#[derive(Error, Debug)]
pub enum StartError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Trim failure: {0}")]
    Trim(#[from] TrimError),
    #[error("Renderer initialization failed: {0}")]
    Render(#[from] RenderError),
    #[error("Failed to start simulation thread: {0}")]
    Thread(#[from] std::io::Error),
}

/// Supplies a fresh display surface for each OTW thread start. The default
/// provider hands out headless surfaces.
pub type SurfaceProvider = Box<dyn FnMut() -> Result<Box<dyn DisplaySurface>, RenderError>>;

/// Orchestrates the processes behind one simulation session: the integration
/// runner thread, the out-the-window render thread, the instrument panel and
/// raw-data console, and post-run plotting.
///
/// All operations are issued from the GUI/event thread and, apart from
/// trimming and `stop_otw_thread`'s join, never block on simulation work.
pub struct SimulationController {
    configuration: SimulationConfig,
    config_path: Option<PathBuf>,
    surface_provider: SurfaceProvider,
    panel: InstrumentPanel,
    runner: Option<RunnerHandle>,
    otw_link: Option<OtwLink>,
    otw: Option<OtwHandle>,
    console: Option<ConsoleView>,
    plot: Option<PlotWindow>,
}

impl SimulationController {
    pub fn new(configuration: SimulationConfig) -> Self {
        Self {
            configuration,
            config_path: None,
            surface_provider: Box::new(|| Ok(Box::new(NullSurface::new()))),
            panel: InstrumentPanel::new(),
            runner: None,
            otw_link: None,
            otw: None,
            console: None,
            plot: None,
        }
    }

    /// Controller whose configuration is reloaded from `path` on every start.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let configuration = SimulationConfig::load(&path)?;
        let mut controller = Self::new(configuration);
        controller.config_path = Some(path);
        Ok(controller)
    }

    pub fn with_surface_provider(mut self, provider: SurfaceProvider) -> Self {
        self.surface_provider = provider;
        self
    }

    pub fn configuration(&self) -> &SimulationConfig {
        &self.configuration
    }

    pub fn instrument_panel(&self) -> &InstrumentPanel {
        &self.panel
    }

    //=============================== Simulation ========================================

    /// Reload the configuration, trim, and start the runner thread plus, in
    /// normal mode, the OTW render thread. Returns as soon as the threads are
    /// spawned; only trimming blocks the caller.
    pub fn start_simulation(&mut self) -> Result<(), StartError> {
        if let Some(runner) = &self.runner {
            if runner.is_running() {
                warn!("simulation is already running, ignoring start request");
                return Ok(());
            }
        }

        self.configuration = self.reload_configuration()?;

        debug!("starting simulation");
        let model = self.configuration.aircraft_model()?;

        debug!("trimming aircraft");
        let trimmed = trim::trim(&self.configuration, &model, false)?;

        if self.configuration.options.analysis_mode {
            info!("running simulation in analysis mode");
            self.initialize_analysis_mode(model, trimmed)
        } else {
            info!("running simulation in normal mode");
            self.initialize_normal_mode(model, trimmed)
        }
    }

    /// Cooperatively stop the runner and tear down the OTW thread and the
    /// console refresh. Benign when nothing was ever started.
    pub fn stop_simulation(&mut self) {
        info!("stopping simulation");

        match &self.runner {
            Some(runner) => runner.stop(),
            None => warn!("stop requested but no simulation has been started"),
        }

        self.stop_otw_thread();
        self.otw_link = None;

        if let Some(console) = &mut self.console {
            console.hide();
        }
    }

    pub fn is_simulation_running(&self) -> bool {
        self.runner.as_ref().map_or(false, |r| r.is_running())
    }

    /// Toggle pause. Unpausing atomically clears any pending reset so the
    /// next pause starts with a fresh one-shot.
    pub fn on_pause_unpause_simulation(&mut self) {
        match &self.runner {
            Some(runner) => {
                let paused = runner.flags().toggle_paused();
                info!(paused, "pause toggled");
            }
            None => warn!("no simulation running, ignoring pause"),
        }
    }

    /// Arm a reset to the trimmed initial condition, at most once per pause.
    pub fn on_reset_simulation(&mut self) {
        match &self.runner {
            Some(runner) => {
                if runner.flags().request_reset_once() {
                    info!("simulation reset armed");
                } else {
                    debug!("reset ignored (not paused, or already reset this pause)");
                }
            }
            None => warn!("no simulation running, ignoring reset"),
        }
    }

    fn reload_configuration(&self) -> Result<SimulationConfig, ConfigError> {
        match &self.config_path {
            Some(path) => SimulationConfig::load(path),
            None => {
                let configuration = self.configuration.clone();
                configuration.validate()?;
                Ok(configuration)
            }
        }
    }

    fn initialize_analysis_mode(
        &mut self,
        model: AircraftModel,
        trimmed: TrimmedState,
    ) -> Result<(), StartError> {
        debug!("initializing simulation runner");
        let mut runner = SimulationRunner::new(&self.configuration, model, trimmed);
        runner.add_flight_data_listener(Box::new(self.panel.clone()));

        self.runner = Some(runner.spawn()?);

        if self.configuration.options.console_display {
            debug!("starting flight data console");
            self.initialize_console();
        }
        Ok(())
    }

    fn initialize_normal_mode(
        &mut self,
        model: AircraftModel,
        trimmed: TrimmedState,
    ) -> Result<(), StartError> {
        debug!("initializing OTW view");
        let link = OtwLink::new();

        debug!("initializing simulation runner");
        let mut runner = SimulationRunner::new(&self.configuration, model, trimmed);
        runner.add_flight_data_listener(Box::new(link.clone()));
        runner.add_flight_data_listener(Box::new(self.panel.clone()));
        self.otw_link = Some(link);

        self.runner = Some(runner.spawn()?);

        if let Err(e) = self.start_otw_thread() {
            error!("failed to start normal mode, tearing down: {e}");
            if let Some(runner) = self.runner.take() {
                runner.stop();
            }
            self.otw_link = None;
            return Err(e.into());
        }

        if self.configuration.options.console_display {
            debug!("starting flight data console");
            self.initialize_console();
        }
        Ok(())
    }

    //=============================== Logs ==============================================

    /// Ordered per-tick records of the current (or most recent) run; empty
    /// when no run has occurred.
    pub fn get_logs_out(&self) -> Vec<LogRecord> {
        self.runner
            .as_ref()
            .map(|r| r.logs().snapshot())
            .unwrap_or_default()
    }

    /// Clear the accumulated log records. Only meaningful while a run is
    /// active; returns whether anything was cleared.
    pub fn clear_logs_out(&self) -> bool {
        match &self.runner {
            Some(runner) if runner.is_running() => {
                runner.logs().clear();
                true
            }
            _ => false,
        }
    }

    //=============================== Plotting ==========================================

    /// Generate plots from the accumulated logs, hiding any previous plot
    /// window first. Failures are logged, never fatal.
    pub fn plot_simulation(&mut self) {
        debug!("plotting simulation results");

        if let Some(plot) = &mut self.plot {
            plot.set_visible(false);
        }

        match PlotWindow::new(&self.get_logs_out()) {
            Ok(plot) => self.plot = Some(plot),
            Err(e) => error!("an error occurred while generating plots: {e}"),
        }
    }

    pub fn plot_window(&self) -> Option<&PlotWindow> {
        self.plot.as_ref()
    }

    pub fn is_plot_window_visible(&self) -> bool {
        self.plot.as_ref().map_or(false, |p| p.is_visible())
    }

    //=============================== Console ===========================================

    /// Open the raw-data console over the current run, hiding any previous
    /// instance so two windows never overlap the same buffer.
    pub fn initialize_console(&mut self) {
        if let Some(console) = &mut self.console {
            console.hide();
        }

        let Some(runner) = &self.runner else {
            warn!("no simulation to display in console");
            return;
        };

        let mut console = ConsoleView::new(runner.logs().clone());
        let period = Duration::from_millis(self.configuration.options.console_refresh_ms);
        match console.start_refresh(period) {
            Ok(()) => self.console = Some(console),
            Err(e) => error!("an error occurred while starting the console panel: {e}"),
        }
    }

    pub fn is_console_window_visible(&self) -> bool {
        self.console.as_ref().map_or(false, |c| c.is_visible())
    }

    /// Serialize the log buffer to a CSV file. I/O failures surface to the
    /// caller rather than being swallowed.
    pub fn save_console_output(&self, path: &Path) -> Result<(), OutputError> {
        debug!("saving console output to {}", path.display());
        save_csv(path, &self.get_logs_out())
    }

    /// Timestamped default name for console exports.
    pub fn timestamped_csv_name() -> String {
        format!(
            "flight_log_{}.csv",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        )
    }

    //=============================== OTW threading =====================================

    /// Spawn the OTW render thread over the current run's view link. No-op
    /// with a warning when no normal-mode run is active.
    pub fn start_otw_thread(&mut self) -> Result<(), RenderError> {
        let Some(link) = self.otw_link.clone() else {
            warn!("no OTW view to start");
            return Ok(());
        };

        let surface = (self.surface_provider)()?;
        let handle =
            OtwRenderer::spawn(link, surface, self.configuration.options.otw_frame_rate_hz)?;
        self.otw = Some(handle);
        Ok(())
    }

    /// Request the renderer to close, then block until its thread has
    /// released the display surface. Abrupt interruption of a thread holding
    /// a live rendering context risks leaking native resources.
    pub fn stop_otw_thread(&mut self) {
        if let Some(otw) = self.otw.take() {
            otw.request_close();
            if otw.join().is_err() {
                error!("OTW render thread panicked during teardown");
            }
        }
    }
}
