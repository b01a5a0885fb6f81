use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::debug;

use crate::sim::{LogBuffer, LogRecord};

struct RefreshTask {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// Raw-data console over one run's log buffer.
///
/// The refresh task polls the buffer on a timer and copies the accumulated
/// rows, the way a table widget would. Hiding the console stops the timer
/// with a request-then-join, so no refresh outlives the window.
pub struct ConsoleView {
    logs: LogBuffer,
    rows: Arc<Mutex<Vec<LogRecord>>>,
    visible: bool,
    refresh: Option<RefreshTask>,
}

impl ConsoleView {
    pub fn new(logs: LogBuffer) -> Self {
        Self {
            logs,
            rows: Arc::new(Mutex::new(Vec::new())),
            visible: true,
            refresh: None,
        }
    }

    /// Start (or restart) the periodic table refresh.
    pub fn start_refresh(&mut self, period: Duration) -> io::Result<()> {
        self.stop_refresh();

        let (stop_tx, stop_rx) = bounded(1);
        let logs = self.logs.clone();
        let rows = self.rows.clone();
        let ticker = tick(period);

        let thread = thread::Builder::new()
            .name("console-refresh".to_string())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => {
                        *rows.lock().unwrap() = logs.snapshot();
                    }
                    recv(stop_rx) -> _ => break,
                }
            })?;

        debug!(period_ms = period.as_millis() as u64, "console refresh started");
        self.refresh = Some(RefreshTask { stop_tx, thread });
        Ok(())
    }

    fn stop_refresh(&mut self) {
        if let Some(task) = self.refresh.take() {
            let _ = task.stop_tx.send(());
            let _ = task.thread.join();
        }
    }

    /// Most recently refreshed rows.
    pub fn rows(&self) -> Vec<LogRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.stop_refresh();
    }
}

impl Drop for ConsoleView {
    fn drop(&mut self) {
        self.stop_refresh();
    }
}
