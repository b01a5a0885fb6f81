pub mod aircraft;
pub mod controller;
pub mod output;
pub mod render;
pub mod sim;
pub mod trim;

pub use aircraft::{Aircraft, AircraftModel, Controls};
pub use controller::{SimulationController, StartError, SurfaceProvider};
pub use output::{save_csv, ConsoleView, OutputError, PlotWindow};
pub use render::{
    DisplaySurface, InstrumentPanel, NullSurface, OtwLink, PanelReadings, RenderError,
};
pub use sim::{
    Channel, FlightDataListener, FlightState, ListenerError, LogBuffer, LogRecord, RunFlags,
    SimOptions, SimulationConfig, SimulationRunner,
};
pub use trim::{trim, TrimError, TrimmedState};
