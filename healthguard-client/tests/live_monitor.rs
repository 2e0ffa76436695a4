//! Live monitor against the mock device simulation

use healthguard_client::config::BackendConfig;
use healthguard_client::models::OverallStatus;
use healthguard_client::{AppContext, ClientConfig, MonitorState, SessionStore};
use healthguard_client::notify::SilentNotifier;
use healthguard_devkit::TestHarness;
use std::sync::Arc;
use std::time::Duration;

fn context(harness: &TestHarness, interval_ms: u64, capacity: usize) -> AppContext {
    let mut config = ClientConfig::default();
    config.backend = BackendConfig::with_origin(harness.origin());
    config.backend.timeout_secs = 5;
    config.monitor.interval_ms = interval_ms;
    config.monitor.history_capacity = capacity;
    AppContext::new(config, SessionStore::in_memory(), Arc::new(SilentNotifier)).unwrap()
}

#[tokio::test]
async fn test_monitor_polls_until_stopped() {
    let harness = TestHarness::start().await.unwrap();
    let ctx = context(&harness, 50, 20);
    let mut monitor = ctx.monitor();

    monitor.start().await.unwrap();
    assert!(harness.backend.monitor_running());
    tokio::time::sleep(Duration::from_millis(300)).await;

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.state, MonitorState::Running);
    assert!(snapshot.history.len() >= 2, "{} samples", snapshot.history.len());
    assert!(snapshot.latest().unwrap().heart_rate.is_some());
    assert_ne!(snapshot.summary.overall_status, OverallStatus::Disconnected);

    monitor.stop().await.unwrap();
    assert!(!harness.backend.monitor_running());
    harness.assert_called("/stop", 1).unwrap();

    let polled = harness.backend.calls("/data");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.backend.calls("/data"), polled);
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert!(monitor.snapshot().history.is_empty());
}

#[tokio::test]
async fn test_history_stays_bounded() {
    let harness = TestHarness::start().await.unwrap();
    let ctx = context(&harness, 10, 5);
    let mut monitor = ctx.monitor();

    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let snapshot = monitor.snapshot();
    monitor.stop().await.unwrap();

    assert!(snapshot.cycles_ok > 5);
    assert_eq!(snapshot.history.len(), 5);
}

#[tokio::test]
async fn test_failed_start_stays_stopped() {
    let harness = TestHarness::start().await.unwrap();
    harness.backend.fail("/start");
    let ctx = context(&harness, 50, 20);
    let mut monitor = ctx.monitor();

    assert!(monitor.start().await.is_err());
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(monitor.state(), MonitorState::Stopped);
    harness.assert_not_called("/data").unwrap();
}

#[tokio::test]
async fn test_cycle_errors_are_not_fatal() {
    let harness = TestHarness::start().await.unwrap();
    let ctx = context(&harness, 30, 20);
    let mut monitor = ctx.monitor();

    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness.backend.fail("/summary");
    // let a cycle already past /summary land first
    tokio::time::sleep(Duration::from_millis(50)).await;
    let before = monitor.snapshot().history.len();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let during = monitor.snapshot();
    assert_eq!(during.history.len(), before);
    assert!(during.cycles_failed > 0);
    assert_eq!(during.state, MonitorState::Running);

    harness.backend.recover("/summary");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(monitor.snapshot().history.len() > before);
    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_with_backend_error_still_stops_polling() {
    let harness = TestHarness::start().await.unwrap();
    let ctx = context(&harness, 30, 20);
    let mut monitor = ctx.monitor();

    monitor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    harness.backend.fail("/stop");

    assert!(monitor.stop().await.is_err());
    let polled = harness.backend.calls("/data");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.backend.calls("/data"), polled);
    assert_eq!(monitor.state(), MonitorState::Stopped);
}
