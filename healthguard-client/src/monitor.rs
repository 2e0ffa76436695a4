/**
 * LIVE MONITOR - Polling loop of the real-time vitals view
 *
 * ROLE :
 * Drives the backend device simulation and keeps a rolling window of the
 * latest vital samples plus the current alert summary.
 *
 * HOW IT WORKS :
 * - STOPPED -> RUNNING : backend `/start`, then one immediate cycle and one
 *   cycle per interval on a spawned tokio task
 * - RUNNING -> STOPPED : task aborted and joined, backend `/stop`
 * - One cycle = `/summary` and `/data` joined; both must succeed, then the
 *   summary is replaced and the sample appended under one lock
 * - Overdue ticks are skipped, never queued
 *
 * CANCELLATION :
 * Every start/stop bumps a generation counter. A cycle re-checks its
 * generation under the lock before mutating anything, so a response still
 * in flight when `stop()` returns is dropped.
 */

use crate::api::ApiGateway;
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::models::{AlertSummary, CurrentSample, VitalSample};
use crate::state::{new_state, Shared};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Backend side of the monitor
#[async_trait]
pub trait VitalsSource: Send + Sync + 'static {
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    async fn summary(&self) -> Result<AlertSummary>;
    async fn current(&self) -> Result<CurrentSample>;
}

#[async_trait]
impl VitalsSource for ApiGateway {
    async fn start(&self) -> Result<()> {
        self.monitor_start().await
    }

    async fn stop(&self) -> Result<()> {
        self.monitor_stop().await
    }

    async fn summary(&self) -> Result<AlertSummary> {
        self.monitor_summary().await
    }

    async fn current(&self) -> Result<CurrentSample> {
        self.monitor_current().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

/// What a single fetch cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied,
    Failed,
    /// Monitor stopped or restarted while the cycle was in flight
    Discarded,
}

/// Fixed-capacity FIFO of the most recent samples
#[derive(Debug, Clone)]
pub struct VitalHistory {
    capacity: usize,
    samples: VecDeque<VitalSample>,
}

impl VitalHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: VitalSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> Option<&VitalSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn to_vec(&self) -> Vec<VitalSample> {
        self.samples.iter().cloned().collect()
    }
}

#[derive(Debug)]
struct MonitorInner {
    state: MonitorState,
    generation: u64,
    summary: AlertSummary,
    history: VitalHistory,
    cycles_ok: u64,
    cycles_failed: u64,
}

/// Copy of the monitor state for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub state: MonitorState,
    pub summary: AlertSummary,
    pub history: Vec<VitalSample>,
    pub cycles_ok: u64,
    pub cycles_failed: u64,
}

impl MonitorSnapshot {
    pub fn latest(&self) -> Option<&VitalSample> {
        self.history.last()
    }
}

/// Normal range shown next to each vital sign
pub struct VitalRange {
    pub label: &'static str,
    pub unit: &'static str,
    pub range: &'static str,
}

pub const VITAL_RANGES: [VitalRange; 4] = [
    VitalRange { label: "Heart rate", unit: "bpm", range: "60-100" },
    VitalRange { label: "Blood oxygen", unit: "%", range: ">=95" },
    VitalRange { label: "Temperature", unit: "°C", range: "36.0-37.2" },
    VitalRange { label: "Blood pressure", unit: "mmHg", range: "<=130/85" },
];

/// Cheap clonable access to the monitor state, usable from other tasks
pub struct MonitorHandle<S: VitalsSource> {
    source: Arc<S>,
    inner: Shared<MonitorInner>,
}

impl<S: VitalsSource> Clone for MonitorHandle<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<S: VitalsSource> MonitorHandle<S> {
    pub fn snapshot(&self) -> MonitorSnapshot {
        let inner = self.inner.lock();
        MonitorSnapshot {
            state: inner.state,
            summary: inner.summary.clone(),
            history: inner.history.to_vec(),
            cycles_ok: inner.cycles_ok,
            cycles_failed: inner.cycles_failed,
        }
    }

    /// One extra fetch cycle outside the timer; no-op while stopped.
    pub async fn refresh(&self) -> CycleOutcome {
        let generation = {
            let inner = self.inner.lock();
            if inner.state != MonitorState::Running {
                return CycleOutcome::Discarded;
            }
            inner.generation
        };
        run_cycle(self.source.as_ref(), &self.inner, generation).await
    }
}

pub struct LiveMonitor<S: VitalsSource> {
    handle: MonitorHandle<S>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl<S: VitalsSource> LiveMonitor<S> {
    pub fn new(source: Arc<S>, config: &MonitorConfig) -> Self {
        let inner = MonitorInner {
            state: MonitorState::Stopped,
            generation: 0,
            summary: AlertSummary::default(),
            history: VitalHistory::new(config.history_capacity),
            cycles_ok: 0,
            cycles_failed: 0,
        };
        Self {
            handle: MonitorHandle {
                source,
                inner: new_state(inner),
            },
            interval: config.interval(),
            task: None,
        }
    }

    pub fn handle(&self) -> MonitorHandle<S> {
        self.handle.clone()
    }

    pub fn state(&self) -> MonitorState {
        self.handle.inner.lock().state
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.handle.snapshot()
    }

    /// A failed backend start leaves the monitor stopped.
    pub async fn start(&mut self) -> Result<()> {
        if self.state() == MonitorState::Running {
            debug!("monitor already running");
            return Ok(());
        }

        self.handle.source.start().await?;

        let generation = {
            let mut inner = self.handle.inner.lock();
            inner.generation += 1;
            inner.state = MonitorState::Running;
            inner.summary = AlertSummary::default();
            inner.history.clear();
            inner.generation
        };

        let handle = self.handle.clone();
        let interval = self.interval;
        self.task = Some(tokio::spawn(async move {
            poll_loop(handle, generation, interval).await;
        }));

        info!("live monitor started (generation {})", generation);
        Ok(())
    }

    /// Polling has stopped for good once this returns, whatever the backend
    /// answers to `/stop`.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state() == MonitorState::Stopped {
            return Ok(());
        }

        {
            let mut inner = self.handle.inner.lock();
            inner.generation += 1;
            inner.state = MonitorState::Stopped;
            inner.history.clear();
        }

        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }

        info!("live monitor stopped");
        self.handle.source.stop().await
    }
}

impl<S: VitalsSource> Drop for LiveMonitor<S> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut inner = self.handle.inner.lock();
        inner.generation += 1;
        inner.state = MonitorState::Stopped;
    }
}

async fn poll_loop<S: VitalsSource>(handle: MonitorHandle<S>, generation: u64, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // first tick completes immediately
        ticker.tick().await;
        if run_cycle(handle.source.as_ref(), &handle.inner, generation).await == CycleOutcome::Discarded {
            debug!("poll loop of generation {} exiting", generation);
            break;
        }
    }
}

async fn run_cycle<S: VitalsSource + ?Sized>(
    source: &S,
    inner: &Shared<MonitorInner>,
    generation: u64,
) -> CycleOutcome {
    let result = tokio::try_join!(source.summary(), source.current());

    let mut inner = inner.lock();
    if inner.generation != generation || inner.state != MonitorState::Running {
        return CycleOutcome::Discarded;
    }

    match result {
        Ok((summary, current)) => {
            inner.summary = summary;
            inner.history.push(VitalSample::from(current));
            inner.cycles_ok += 1;
            CycleOutcome::Applied
        }
        Err(e) => {
            // transient, the next tick retries
            inner.cycles_failed += 1;
            warn!("monitor fetch cycle failed: {}", e);
            CycleOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::models::OverallStatus;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicU64,
        starts: AtomicU64,
        stops: AtomicU64,
        fail_start: AtomicBool,
        fail_fetch: AtomicBool,
        gates: Mutex<HashMap<u64, oneshot::Receiver<()>>>,
    }

    impl FakeSource {
        /// Holds the `call`-th sample request until the sender fires
        fn gate(&self, call: u64) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(call, rx);
            tx
        }
    }

    #[async_trait]
    impl VitalsSource for FakeSource {
        async fn start(&self) -> Result<()> {
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(ClientError::backend(Some(503), "simulator offline"));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn summary(&self) -> Result<AlertSummary> {
            Ok(AlertSummary {
                overall_status: OverallStatus::Normal,
                alerts: vec![],
            })
        }

        async fn current(&self) -> Result<CurrentSample> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().remove(&call);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(ClientError::backend(Some(500), "sensor glitch"));
            }
            Ok(CurrentSample {
                heart_rate: Some(70.0 + call as f64),
                timestamp: Some(format!("t{}", call)),
                ..Default::default()
            })
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig {
            interval_ms: 2000,
            history_capacity: 20,
        }
    }

    fn sample(ts: &str) -> VitalSample {
        VitalSample::from(CurrentSample {
            timestamp: Some(ts.to_string()),
            ..Default::default()
        })
    }

    fn timestamps(snapshot: &MonitorSnapshot) -> Vec<String> {
        snapshot.history.iter().map(|s| s.timestamp.clone()).collect()
    }

    #[test]
    fn test_history_evicts_oldest_first() {
        let mut history = VitalHistory::new(20);
        for i in 0..25 {
            history.push(sample(&format!("s{}", i)));
            assert!(history.len() <= 20);
        }
        let all = history.to_vec();
        assert_eq!(all.len(), 20);
        assert_eq!(all.first().unwrap().timestamp, "s5");
        assert_eq!(history.latest().unwrap().timestamp, "s24");
        assert!(all.windows(2).all(|w| {
            w[0].timestamp[1..].parse::<u32>().unwrap() < w[1].timestamp[1..].parse::<u32>().unwrap()
        }));
    }

    #[test]
    fn test_history_capacity_floor() {
        let mut history = VitalHistory::new(0);
        history.push(sample("a"));
        history.push(sample("b"));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.latest().unwrap().timestamp, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_polls_immediately_then_every_interval() {
        let source = Arc::new(FakeSource::default());
        let mut monitor = LiveMonitor::new(source.clone(), &config());
        assert_eq!(monitor.state(), MonitorState::Stopped);

        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(monitor.snapshot().history.len(), 1);

        tokio::time::sleep(Duration::from_millis(4000)).await;
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.state, MonitorState::Running);
        assert_eq!(timestamps(&snapshot), vec!["t0", "t1", "t2"]);
        assert_eq!(snapshot.summary.overall_status, OverallStatus::Normal);
        assert_eq!(source.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let source = Arc::new(FakeSource::default());
        let mut monitor = LiveMonitor::new(source.clone(), &config());
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        monitor.stop().await.unwrap();
        let calls = source.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
        assert_eq!(source.stops.load(Ordering::SeqCst), 1);
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.state, MonitorState::Stopped);
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_start_stays_stopped() {
        let source = Arc::new(FakeSource::default());
        source.fail_start.store(true, Ordering::SeqCst);
        let mut monitor = LiveMonitor::new(source.clone(), &config());

        assert!(monitor.start().await.is_err());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_keeps_previous_state() {
        let source = Arc::new(FakeSource::default());
        let mut monitor = LiveMonitor::new(source.clone(), &config());
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let before = monitor.snapshot();

        source.fail_fetch.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(4000)).await;

        let after = monitor.snapshot();
        assert_eq!(after.history, before.history);
        assert_eq!(after.summary, before.summary);
        assert_eq!(after.cycles_failed, 2);
        assert_eq!(after.state, MonitorState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_stop_is_dropped() {
        let source = Arc::new(FakeSource::default());
        let mut monitor = LiveMonitor::new(source.clone(), &config());
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // call 1 is the manual refresh below, held in flight
        let release = source.gate(1);
        let handle = monitor.handle();
        let in_flight = tokio::spawn(async move { handle.refresh().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        monitor.stop().await.unwrap();
        release.send(()).unwrap();

        assert_eq!(in_flight.await.unwrap(), CycleOutcome::Discarded);
        let snapshot = monitor.snapshot();
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.cycles_ok, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_cannot_touch_restarted_monitor() {
        let source = Arc::new(FakeSource::default());
        let mut monitor = LiveMonitor::new(source.clone(), &config());
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let release = source.gate(1);
        let handle = monitor.handle();
        let in_flight = tokio::spawn(async move { handle.refresh().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        monitor.stop().await.unwrap();
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        release.send(()).unwrap();

        assert_eq!(in_flight.await.unwrap(), CycleOutcome::Discarded);
        assert_eq!(timestamps(&monitor.snapshot()), vec!["t2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_responses_append_in_receipt_order() {
        let source = Arc::new(FakeSource::default());
        let mut monitor = LiveMonitor::new(source.clone(), &config());
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let release_first = source.gate(1);
        let handle = monitor.handle();
        let first = tokio::spawn(async move { handle.refresh().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // second request overtakes the first
        assert_eq!(monitor.handle().refresh().await, CycleOutcome::Applied);
        release_first.send(()).unwrap();
        assert_eq!(first.await.unwrap(), CycleOutcome::Applied);

        assert_eq!(timestamps(&monitor.snapshot()), vec!["t0", "t2", "t1"]);
        monitor.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_while_stopped_is_noop() {
        let source = Arc::new(FakeSource::default());
        let monitor = LiveMonitor::new(source.clone(), &config());
        assert_eq!(monitor.handle().refresh().await, CycleOutcome::Discarded);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let source = Arc::new(FakeSource::default());
        let mut monitor = LiveMonitor::new(source.clone(), &config());
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(monitor);

        let calls = source.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }
}
