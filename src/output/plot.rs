use std::path::Path;

use glam::Vec2;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};
use tracing::debug;

use super::OutputError;
use crate::sim::{Channel, LogRecord};

const CHART_WIDTH: u32 = 900;
const CHART_HEIGHT: u32 = 300;
const MARGIN: f32 = 20.0;

const SERIES_COLORS: [(u8, u8, u8); 4] = [
    (31, 119, 180),
    (214, 69, 52),
    (44, 160, 44),
    (148, 103, 189),
];

/// Channel groups plotted against time after a run.
const CHART_GROUPS: [(&str, &[Channel]); 5] = [
    ("altitude", &[Channel::Altitude]),
    ("airspeed", &[Channel::Airspeed]),
    ("attitude", &[Channel::Roll, Channel::Pitch, Channel::Heading]),
    ("rates", &[Channel::P, Channel::Q, Channel::R]),
    (
        "controls",
        &[
            Channel::Elevator,
            Channel::Aileron,
            Channel::Rudder,
            Channel::Throttle,
        ],
    ),
];

/// Post-run strip charts of the log buffer, one pixmap per channel group.
pub struct PlotWindow {
    charts: Vec<(String, Pixmap)>,
    visible: bool,
}

impl PlotWindow {
    pub fn new(records: &[LogRecord]) -> Result<Self, OutputError> {
        if records.is_empty() {
            return Err(OutputError::NoData);
        }

        let mut charts = Vec::with_capacity(CHART_GROUPS.len());
        for (label, channels) in CHART_GROUPS {
            let chart = render_chart(records, channels)?;
            charts.push((label.to_string(), chart));
        }

        debug!(charts = charts.len(), ticks = records.len(), "plots generated");
        Ok(Self {
            charts,
            visible: true,
        })
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn charts(&self) -> &[(String, Pixmap)] {
        &self.charts
    }

    /// Write every chart as `<label>.png` into the given directory.
    pub fn save_png(&self, dir: &Path) -> Result<(), OutputError> {
        for (label, chart) in &self.charts {
            let path = dir.join(format!("{label}.png"));
            chart
                .save_png(&path)
                .map_err(|e| OutputError::Plot(e.to_string()))?;
        }
        Ok(())
    }
}

fn render_chart(records: &[LogRecord], channels: &[Channel]) -> Result<Pixmap, OutputError> {
    let mut canvas = Pixmap::new(CHART_WIDTH, CHART_HEIGHT)
        .ok_or_else(|| OutputError::Plot("failed to allocate chart pixmap".to_string()))?;
    canvas.fill(Color::WHITE);

    let t0 = records[0].get(Channel::Time);
    let t1 = records[records.len() - 1].get(Channel::Time);
    let time_span = (t1 - t0).max(1e-9);

    // Common vertical scale across the group's channels
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for record in records {
        for &channel in channels {
            let v = record.get(channel);
            min = min.min(v);
            max = max.max(v);
        }
    }
    let value_span = (max - min).max(1e-9);

    let plot_size = Vec2::new(
        CHART_WIDTH as f32 - 2.0 * MARGIN,
        CHART_HEIGHT as f32 - 2.0 * MARGIN,
    );

    let mut axis = Paint::default();
    axis.set_color(Color::from_rgba8(60, 60, 60, 255));
    if let Some(rect) = Rect::from_xywh(MARGIN, MARGIN, plot_size.x, 1.0) {
        canvas.fill_rect(rect, &axis, Transform::identity(), None);
    }
    if let Some(rect) = Rect::from_xywh(MARGIN, MARGIN, 1.0, plot_size.y) {
        canvas.fill_rect(rect, &axis, Transform::identity(), None);
    }

    let stroke = Stroke {
        width: 1.5,
        ..Stroke::default()
    };

    for (series, &channel) in channels.iter().enumerate() {
        let mut path = PathBuilder::new();
        for (i, record) in records.iter().enumerate() {
            let t = record.get(Channel::Time);
            let v = record.get(channel);
            let x = MARGIN + ((t - t0) / time_span) as f32 * plot_size.x;
            let y = MARGIN + (1.0 - ((v - min) / value_span) as f32) * plot_size.y;
            if i == 0 {
                path.move_to(x, y);
            } else {
                path.line_to(x, y);
            }
        }

        if let Some(path) = path.finish() {
            let (r, g, b) = SERIES_COLORS[series % SERIES_COLORS.len()];
            let mut paint = Paint::default();
            paint.set_color(Color::from_rgba8(r, g, b, 255));
            paint.anti_alias = true;
            canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{Aircraft, AircraftModel, Controls};
    use crate::sim::FlightState;
    use aerso::types::{UnitQuaternion, Vector3};

    fn records(n: usize) -> Vec<LogRecord> {
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
        (0..n)
            .map(|i| {
                aircraft.step(0.01, &controls);
                FlightState::capture(i as f64 * 0.01, &aircraft, &controls).record()
            })
            .collect()
    }

    #[test]
    fn plots_require_records() {
        assert!(matches!(PlotWindow::new(&[]), Err(OutputError::NoData)));
    }

    #[test]
    fn one_chart_per_group() {
        let plot = PlotWindow::new(&records(50)).unwrap();
        assert_eq!(plot.charts().len(), CHART_GROUPS.len());
        assert!(plot.is_visible());
    }

    #[test]
    fn save_png_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let plot = PlotWindow::new(&records(20)).unwrap();
        plot.save_png(dir.path()).unwrap();
        assert!(dir.path().join("altitude.png").exists());
        assert!(dir.path().join("controls.png").exists());
    }
}
