mod otw;
mod panel;

pub use otw::{DisplaySurface, NullSurface, OtwHandle, OtwLink, OtwRenderer, RenderError};
pub use panel::{InstrumentPanel, PanelReadings};
