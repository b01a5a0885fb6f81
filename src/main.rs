use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sixdof::{SimulationConfig, SimulationController};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut controller = match std::env::args().nth(1) {
        Some(path) => match SimulationController::from_file(&path) {
            Ok(controller) => controller,
            Err(e) => {
                error!("failed to load configuration {path}: {e}");
                std::process::exit(1);
            }
        },
        None => SimulationController::new(SimulationConfig::default()),
    };

    if let Err(e) = controller.start_simulation() {
        error!("failed to start simulation: {e}");
        std::process::exit(1);
    }

    if controller.configuration().options.analysis_mode {
        // Analysis runs stop themselves once the configured duration is done
        while controller.is_simulation_running() {
            thread::sleep(Duration::from_millis(100));
        }
    } else {
        let duration = controller.configuration().run_duration_s.unwrap_or(30.0);
        thread::sleep(Duration::from_secs_f64(duration));
    }

    let csv_name = SimulationController::timestamped_csv_name();
    match controller.save_console_output(Path::new(&csv_name)) {
        Ok(()) => info!("flight log saved to {csv_name}"),
        Err(e) => error!("failed to save flight log: {e}"),
    }

    controller.plot_simulation();
    if let Some(plot) = controller.plot_window() {
        if let Err(e) = plot.save_png(Path::new(".")) {
            error!("failed to save plots: {e}");
        }
    }

    controller.stop_simulation();
}
