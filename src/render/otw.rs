use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use glam::Vec2;
use thiserror::Error;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use tracing::{error, info};

use crate::sim::{FlightDataListener, FlightState, ListenerError};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to allocate {width}x{height} frame buffer")]
    FrameBuffer { width: u32, height: u32 },
    #[error("Failed to start render thread: {0}")]
    Thread(#[from] std::io::Error),
    #[error("Display surface failure: {0}")]
    Surface(String),
}

/// The narrow capability the controller holds onto instead of any window
/// toolkit state: something frames can be pushed to and that can release its
/// native resources on request.
pub trait DisplaySurface: Send {
    fn present(&mut self, frame: &Pixmap) -> Result<(), RenderError>;

    /// Release native resources. Called exactly once, on the render thread,
    /// after the close request has been observed.
    fn dispose(&mut self);
}

/// Headless surface that drops frames. Default when no real window is wired up.
#[derive(Debug, Default)]
pub struct NullSurface;

impl NullSurface {
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySurface for NullSurface {
    fn present(&mut self, _frame: &Pixmap) -> Result<(), RenderError> {
        Ok(())
    }

    fn dispose(&mut self) {}
}

/// Listener half of the out-the-window view: stows the latest snapshot for
/// the render thread, which reads it at its own cadence. No history is kept.
#[derive(Debug, Clone, Default)]
pub struct OtwLink {
    latest: Arc<Mutex<Option<FlightState>>>,
}

impl OtwLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<FlightState> {
        self.latest.lock().unwrap().clone()
    }
}

impl FlightDataListener for OtwLink {
    fn name(&self) -> &str {
        "otw"
    }

    fn on_flight_data(&self, snapshot: &FlightState) -> Result<(), ListenerError> {
        *self.latest.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}

const OTW_WIDTH: u32 = 800;
const OTW_HEIGHT: u32 = 600;
/// Screen-space pitch scale of the artificial horizon.
const PIXELS_PER_RAD: f32 = 400.0;

/// Out-the-window render thread: draws an attitude view of the latest
/// snapshot into a pixmap and pushes it to the display surface.
pub struct OtwRenderer {
    link: OtwLink,
    surface: Box<dyn DisplaySurface>,
    frame_period: Duration,
    close_rx: Receiver<()>,
}

impl OtwRenderer {
    /// Start the render thread. Stopping is a request-then-join protocol via
    /// the returned handle; the thread is never interrupted while it holds
    /// the surface.
    pub fn spawn(
        link: OtwLink,
        surface: Box<dyn DisplaySurface>,
        frame_rate_hz: f64,
    ) -> Result<OtwHandle, RenderError> {
        let (close_tx, close_rx) = bounded(1);

        let renderer = OtwRenderer {
            link,
            surface,
            frame_period: Duration::from_secs_f64(1.0 / frame_rate_hz.max(1.0)),
            close_rx,
        };

        let thread = thread::Builder::new()
            .name("otw-render".to_string())
            .spawn(move || renderer.run())?;

        Ok(OtwHandle { close_tx, thread })
    }

    fn run(mut self) {
        info!("OTW renderer started");

        let mut canvas = match Pixmap::new(OTW_WIDTH, OTW_HEIGHT) {
            Some(canvas) => canvas,
            None => {
                error!("failed to allocate OTW frame buffer");
                self.surface.dispose();
                return;
            }
        };

        loop {
            match self.close_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            if let Some(state) = self.link.latest() {
                draw_attitude(&mut canvas, &state);
                if let Err(e) = self.surface.present(&canvas) {
                    error!("OTW present failed: {e}");
                }
            }

            thread::sleep(self.frame_period);
        }

        // Clean native-resource release before the join on the other side
        // returns.
        self.surface.dispose();
        info!("OTW renderer exited");
    }
}

/// Handle to a running OTW thread. Close is cooperative: `request_close`
/// then `join`, which returns only after the renderer disposed its surface.
pub struct OtwHandle {
    close_tx: Sender<()>,
    thread: JoinHandle<()>,
}

impl OtwHandle {
    pub fn request_close(&self) {
        let _ = self.close_tx.try_send(());
    }

    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Artificial-horizon view: sky over ground, rotated by roll and shifted by
/// pitch, with a fixed center reticle.
fn draw_attitude(canvas: &mut Pixmap, state: &FlightState) {
    let (roll, pitch, _heading) = state.euler_angles();
    let center = Vec2::new(OTW_WIDTH as f32 / 2.0, OTW_HEIGHT as f32 / 2.0);

    let mut sky = Paint::default();
    sky.set_color(Color::from_rgba8(92, 160, 224, 255));
    sky.anti_alias = true;

    let mut ground = Paint::default();
    ground.set_color(Color::from_rgba8(120, 86, 52, 255));
    ground.anti_alias = true;

    if let Some(rect) = Rect::from_xywh(0.0, 0.0, OTW_WIDTH as f32, OTW_HEIGHT as f32) {
        canvas.fill_rect(rect, &sky, Transform::identity(), None);
    }

    // Ground plane: oversized so roll rotation never exposes a corner
    let horizon_y = center.y + pitch as f32 * PIXELS_PER_RAD;
    let span = (OTW_WIDTH.max(OTW_HEIGHT) * 2) as f32;
    if let Some(rect) = Rect::from_xywh(center.x - span, horizon_y, 2.0 * span, 2.0 * span) {
        let mut path = PathBuilder::new();
        path.push_rect(rect);
        if let Some(path) = path.finish() {
            let transform =
                Transform::from_rotate_at((-roll).to_degrees() as f32, center.x, center.y);
            canvas.fill_path(&path, &ground, FillRule::Winding, transform, None);
        }
    }

    // Fixed aircraft reference reticle
    let mut reticle = Paint::default();
    reticle.set_color(Color::from_rgba8(250, 210, 40, 255));
    for (dx, w) in [(-60.0, 40.0), (20.0, 40.0), (-2.5, 5.0)] {
        if let Some(rect) = Rect::from_xywh(center.x + dx, center.y - 2.5, w, 5.0) {
            canvas.fill_rect(rect, &reticle, Transform::identity(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{Aircraft, AircraftModel, Controls};
    use aerso::types::{UnitQuaternion, Vector3};

    fn snapshot() -> FlightState {
        let model = AircraftModel::default();
        let aircraft = Aircraft::new(
            &model,
            Vector3::new(0.0, 0.0, -1000.0),
            Vector3::new(50.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.3, 0.1, 0.0),
            Vector3::zeros(),
        );
        FlightState::capture(0.0, &aircraft, &Controls::default())
    }

    #[test]
    fn link_stores_latest_snapshot() {
        let link = OtwLink::new();
        assert!(link.latest().is_none());
        link.on_flight_data(&snapshot()).unwrap();
        let latest = link.latest().unwrap();
        assert_eq!(latest.altitude(), 1000.0);
    }

    #[test]
    fn close_request_then_join_disposes_surface() {
        use std::sync::atomic::{AtomicBool, Ordering};

        struct ProbeSurface {
            disposed: Arc<AtomicBool>,
        }
        impl DisplaySurface for ProbeSurface {
            fn present(&mut self, _frame: &Pixmap) -> Result<(), RenderError> {
                Ok(())
            }
            fn dispose(&mut self) {
                self.disposed.store(true, Ordering::SeqCst);
            }
        }

        let disposed = Arc::new(AtomicBool::new(false));
        let link = OtwLink::new();
        link.on_flight_data(&snapshot()).unwrap();

        let handle = OtwRenderer::spawn(
            link,
            Box::new(ProbeSurface {
                disposed: disposed.clone(),
            }),
            60.0,
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        handle.request_close();
        handle.join().unwrap();
        assert!(disposed.load(Ordering::SeqCst));
    }

    #[test]
    fn draw_attitude_fills_frame() {
        let mut canvas = Pixmap::new(OTW_WIDTH, OTW_HEIGHT).unwrap();
        draw_attitude(&mut canvas, &snapshot());
        // Something other than the zeroed pixmap must have been drawn
        assert!(canvas.data().iter().any(|&b| b != 0));
    }
}
