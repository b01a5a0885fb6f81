use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Per-run behaviour flags, loaded as part of the configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimOptions {
    /// Run without interactive rendering, batch-producing logs and plots.
    pub analysis_mode: bool,
    /// Open the raw-data console alongside the run.
    pub console_display: bool,
    /// Frame rate of the out-the-window view [Hz].
    pub otw_frame_rate_hz: f64,
    /// Refresh period of the raw-data console [ms].
    pub console_refresh_ms: u64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            analysis_mode: false,
            console_display: false,
            otw_frame_rate_hz: 30.0,
            console_refresh_ms: 250,
        }
    }
}

#[derive(Debug, Default)]
struct FlagState {
    paused: bool,
    reset_pending: bool,
    /// Set once a reset has been requested during the current pause; only an
    /// unpause clears it, making reset one-shot per pause.
    reset_latched: bool,
}

/// Shared pause/reset state machine between the GUI thread and the runner.
///
/// All transitions are compound and taken under one lock, so the tick loop
/// can never observe the pair of flags half-applied.
#[derive(Debug, Clone, Default)]
pub struct RunFlags {
    inner: Arc<Mutex<FlagState>>,
}

impl RunFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the paused flag. Unpausing atomically clears any pending reset
    /// and re-arms the one-shot latch. Returns the new paused state.
    pub fn toggle_paused(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.paused {
            state.paused = false;
            state.reset_pending = false;
            state.reset_latched = false;
        } else {
            state.paused = true;
        }
        state.paused
    }

    /// Arm a reset, at most once per pause. Returns whether the request took
    /// effect; requests while unpaused or already latched are no-ops.
    pub fn request_reset_once(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.paused && !state.reset_latched {
            state.reset_pending = true;
            state.reset_latched = true;
            true
        } else {
            false
        }
    }

    /// Consume a pending reset. Called by the runner's tick loop; the latch
    /// stays set so a second request within the same pause cannot re-arm.
    pub fn take_reset(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.reset_pending {
            state.reset_pending = false;
            true
        } else {
            false
        }
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().unwrap().paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_pause_round_trip() {
        let flags = RunFlags::new();
        assert!(!flags.is_paused());
        assert!(flags.toggle_paused());
        assert!(flags.is_paused());
        assert!(!flags.toggle_paused());
        assert!(!flags.is_paused());
    }

    #[test]
    fn reset_requires_pause() {
        let flags = RunFlags::new();
        assert!(!flags.request_reset_once());
        assert!(!flags.take_reset());
    }

    #[test]
    fn reset_is_one_shot_per_pause() {
        let flags = RunFlags::new();
        flags.toggle_paused();

        assert!(flags.request_reset_once());
        assert!(!flags.request_reset_once());
        assert!(flags.take_reset());
        // Still latched: a second press in the same pause does nothing
        assert!(!flags.request_reset_once());
        assert!(!flags.take_reset());

        // Unpause re-arms the latch for the next pause
        flags.toggle_paused();
        flags.toggle_paused();
        assert!(flags.request_reset_once());
        assert!(flags.take_reset());
    }

    #[test]
    fn unpause_clears_pending_reset() {
        let flags = RunFlags::new();
        flags.toggle_paused();
        assert!(flags.request_reset_once());
        // Unpause before the runner consumed the reset
        flags.toggle_paused();
        assert!(!flags.take_reset());
    }

    #[test]
    fn at_most_one_reset_between_unpauses() {
        // Arbitrary interleavings of pause/reset presses only ever yield one
        // consumed reset per pause cycle.
        let flags = RunFlags::new();
        for _ in 0..3 {
            flags.toggle_paused();
            let mut consumed = 0;
            for _ in 0..5 {
                flags.request_reset_once();
                if flags.take_reset() {
                    consumed += 1;
                }
            }
            assert_eq!(consumed, 1);
            flags.toggle_paused();
        }
    }
}
