mod console;
mod plot;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::sim::{Channel, LogRecord};

pub use console::ConsoleView;
pub use plot::PlotWindow;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No log records to export")]
    NoData,
    #[error("Plot rendering failed: {0}")]
    Plot(String),
}

/// Row-oriented export of the log buffer: one row per tick, one column per
/// named channel.
pub fn save_csv(path: &Path, records: &[LogRecord]) -> Result<(), OutputError> {
    if records.is_empty() {
        return Err(OutputError::NoData);
    }

    let mut writer = BufWriter::new(File::create(path)?);

    let header: Vec<&str> = Channel::ALL.iter().map(|c| c.as_str()).collect();
    writeln!(writer, "{}", header.join(","))?;

    for record in records {
        let row: Vec<String> = record.values().iter().map(|v| format!("{v:.6}")).collect();
        writeln!(writer, "{}", row.join(","))?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{Aircraft, AircraftModel, Controls};
    use aerso::types::{UnitQuaternion, Vector3};
    use crate::sim::FlightState;
    use pretty_assertions::assert_eq;

    fn records(n: usize) -> Vec<LogRecord> {
        let model = AircraftModel::default();
        let aircraft = Aircraft::new(
            &model,
            Vector3::new(0.0, 0.0, -1000.0),
            Vector3::new(50.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            Vector3::zeros(),
        );
        (0..n)
            .map(|i| FlightState::capture(i as f64 * 0.01, &aircraft, &Controls::default()).record())
            .collect()
    }

    #[test]
    fn csv_has_header_and_one_row_per_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        save_csv(&path, &records(5)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("time,north,east,altitude"));
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), Channel::ALL.len());
        }
    }

    #[test]
    fn empty_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert!(matches!(save_csv(&path, &[]), Err(OutputError::NoData)));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_destination_surfaces_io_error() {
        let result = save_csv(Path::new("/nonexistent-dir/out.csv"), &records(1));
        assert!(matches!(result, Err(OutputError::Io(_))));
    }
}
