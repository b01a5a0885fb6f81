mod common;

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

use common::{test_config, test_trimmed, time_restarts, CountingListener, FailingListener};
use sixdof::{AircraftModel, Channel, SimulationRunner};

#[test]
fn cooperative_stop_exits_thread() {
    let runner = SimulationRunner::new(&test_config(), AircraftModel::default(), test_trimmed());
    let handle = runner.spawn().unwrap();
    assert!(handle.is_running());

    handle.stop();
    assert!(!handle.is_running());
    handle.join().unwrap();
}

#[test]
fn tick_count_tracks_elapsed_time() {
    let mut runner =
        SimulationRunner::new(&test_config(), AircraftModel::default(), test_trimmed());
    let counting = CountingListener::new();
    let ticks = counting.ticks.clone();
    runner.add_flight_data_listener(Box::new(counting));

    let handle = runner.spawn().unwrap();
    thread::sleep(Duration::from_millis(500));
    handle.stop();

    let logs = handle.logs().clone();
    handle.join().unwrap();

    // 100 Hz for ~500 ms; generous bounds for scheduler jitter
    let n = logs.len();
    assert!((35..=65).contains(&n), "unexpected tick count {n}");
    assert_eq!(ticks.load(Ordering::SeqCst), n);

    let records = logs.snapshot();
    assert_relative_eq!(
        records[records.len() - 1].get(Channel::Time),
        n as f64 * 0.01,
        epsilon = 1e-9
    );
}

#[test]
fn pause_halts_integration() {
    let runner = SimulationRunner::new(&test_config(), AircraftModel::default(), test_trimmed());
    let handle = runner.spawn().unwrap();

    thread::sleep(Duration::from_millis(150));
    assert!(handle.flags().toggle_paused());
    // Let any in-flight tick land
    thread::sleep(Duration::from_millis(50));
    let frozen = handle.logs().len();
    assert!(frozen > 0);

    thread::sleep(Duration::from_millis(150));
    assert_eq!(handle.logs().len(), frozen);

    handle.stop();
    handle.join().unwrap();
}

#[test]
fn repeated_reset_requests_apply_once() {
    let runner = SimulationRunner::new(&test_config(), AircraftModel::default(), test_trimmed());
    let handle = runner.spawn().unwrap();

    thread::sleep(Duration::from_millis(200));
    handle.flags().toggle_paused();
    thread::sleep(Duration::from_millis(50));

    // Mash the reset button while paused
    assert!(handle.flags().request_reset_once());
    assert!(!handle.flags().request_reset_once());
    assert!(!handle.flags().request_reset_once());
    thread::sleep(Duration::from_millis(50));

    handle.flags().toggle_paused();
    thread::sleep(Duration::from_millis(200));
    handle.stop();

    let records = handle.logs().snapshot();
    handle.join().unwrap();

    // The clock restarts exactly once across the whole record stream
    assert_eq!(time_restarts(&records), 1);
}

#[test]
fn paused_analysis_run_idles_until_stopped() {
    let mut config = test_config();
    config.options.analysis_mode = true;
    config.run_duration_s = Some(3600.0);

    let runner = SimulationRunner::new(&config, AircraftModel::default(), test_trimmed());
    let handle = runner.spawn().unwrap();

    thread::sleep(Duration::from_millis(20));
    assert!(handle.flags().toggle_paused());
    thread::sleep(Duration::from_millis(50));
    let frozen = handle.logs().len();
    assert!(frozen > 0);

    // Paused and unpaced: the loop must hold, not spin off more ticks
    thread::sleep(Duration::from_millis(150));
    assert_eq!(handle.logs().len(), frozen);
    assert!(handle.is_running());

    // Stop lands promptly even though the run never unpaused
    handle.stop();
    handle.join().unwrap();
}

#[test]
fn handle_exposes_latest_snapshot() {
    let runner = SimulationRunner::new(&test_config(), AircraftModel::default(), test_trimmed());
    let handle = runner.spawn().unwrap();
    thread::sleep(Duration::from_millis(200));
    handle.stop();
    // Let any in-flight tick land before comparing the two views
    thread::sleep(Duration::from_millis(100));

    let latest = handle.latest().expect("at least one tick ran");
    let records = handle.logs().snapshot();
    handle.join().unwrap();

    assert_relative_eq!(
        latest.time,
        records[records.len() - 1].get(Channel::Time),
        epsilon = 1e-9
    );
    assert!(latest.altitude() > 0.0);
}

#[test]
fn failing_listener_does_not_abort_run() {
    let mut runner =
        SimulationRunner::new(&test_config(), AircraftModel::default(), test_trimmed());
    runner.add_flight_data_listener(Box::new(FailingListener));
    let counting = CountingListener::new();
    let ticks = counting.ticks.clone();
    runner.add_flight_data_listener(Box::new(counting));

    let handle = runner.spawn().unwrap();
    thread::sleep(Duration::from_millis(200));
    assert!(handle.is_running());
    handle.stop();

    let logged = handle.logs().len();
    handle.join().unwrap();

    // Every tick still reached the listener registered after the failing one
    assert!(logged > 0);
    assert_eq!(ticks.load(Ordering::SeqCst), logged);
}

#[test]
fn analysis_run_stops_at_configured_duration() {
    let mut config = test_config();
    config.options.analysis_mode = true;
    config.run_duration_s = Some(0.5);

    let runner = SimulationRunner::new(&config, AircraftModel::default(), test_trimmed());
    let handle = runner.spawn().unwrap();

    let logs = handle.logs().clone();
    handle.join().unwrap();

    // Unpaced: 0.5 s of simulated time at 100 Hz
    let records = logs.snapshot();
    assert_eq!(records.len(), 50);
    assert_relative_eq!(
        records[records.len() - 1].get(Channel::Time),
        0.5,
        epsilon = 1e-9
    );
}
