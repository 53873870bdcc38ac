//! Instance monitor implementation
//!
//! Keeps a heap diff running at all times: every interval the current diff is
//! stopped with a report, the report is broadcast as an `Instances` event, and
//! a new diff is started straight away.

use heapdiff::DiffSession;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::types::{InstancesEvent, MonitorError};

/// Default interval between two steps
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(15);

/// Default capacity of the event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Periodic instance-count monitor
pub struct InstanceMonitor {
    /// Diff orchestrator being stepped
    diff: Arc<dyn DiffSession>,
    /// Time between two steps
    interval: Duration,
    /// Whether monitoring is active
    running: Arc<AtomicBool>,
    /// Timer task, while running
    task: Mutex<Option<JoinHandle<()>>>,
    /// Event fan-out
    events: broadcast::Sender<InstancesEvent>,
    /// Number of steps taken
    steps: Arc<AtomicU64>,
    /// Held for a whole step and while stopping, so a stop never lands
    /// between a step's report and its restart
    step_lock: Arc<Mutex<()>>,
}

impl InstanceMonitor {
    /// Create a monitor with the default event capacity
    pub fn new(diff: Arc<dyn DiffSession>, interval: Duration) -> Self {
        Self::with_capacity(diff, interval, DEFAULT_EVENT_CAPACITY)
    }

    /// Create a monitor with a custom event channel capacity
    pub fn with_capacity(diff: Arc<dyn DiffSession>, interval: Duration, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            diff,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            events,
            steps: Arc::new(AtomicU64::new(0)),
            step_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Check if monitoring is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Interval between two steps
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of steps taken since creation
    pub fn steps_completed(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    /// Subscribe to `Instances` events
    pub fn subscribe(&self) -> broadcast::Receiver<InstancesEvent> {
        self.events.subscribe()
    }

    /// Start monitoring
    ///
    /// Starts a diff, takes one step immediately and then one step per
    /// interval. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), MonitorError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(MonitorError::AlreadyRunning);
        }

        info!("Instance monitoring started, interval {:?}", self.interval);
        self.diff.start_diff();
        self.step();

        let diff = Arc::clone(&self.diff);
        let events = self.events.clone();
        let running = Arc::clone(&self.running);
        let steps = Arc::clone(&self.steps);
        let step_lock = Arc::clone(&self.step_lock);
        let interval = self.interval;

        let handle = runtime.spawn(async move {
            let mut ticker = step_interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let _step = step_lock.lock();
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                run_step(diff.as_ref(), &events, &steps);
            }
        });
        *self.task.lock() = Some(handle);

        Ok(())
    }

    /// Stop monitoring and discard the in-flight diff
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        // Waits out a step in flight; the timer task sees `running` cleared
        // before it can start another one.
        let _step = self.step_lock.lock();
        self.diff.stop_diff(false);
        info!("Instance monitoring stopped");
    }

    /// Start when stopped, stop when running
    pub fn toggle(&self) -> Result<bool, MonitorError> {
        if self.is_running() {
            self.stop();
            Ok(false)
        } else {
            self.start().map(|_| true)
        }
    }

    /// Take one step right now
    ///
    /// Stops the current diff with a report, restarts it and broadcasts the
    /// result.
    pub fn step(&self) -> InstancesEvent {
        let _step = self.step_lock.lock();
        run_step(self.diff.as_ref(), &self.events, &self.steps)
    }
}

/// Step timer that waits a full interval after a late step instead of
/// firing the missed ticks back to back
fn step_interval(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn run_step(
    diff: &dyn DiffSession,
    events: &broadcast::Sender<InstancesEvent>,
    steps: &AtomicU64,
) -> InstancesEvent {
    let state = diff.stop_diff(true);
    diff.start_diff();

    let event = InstancesEvent::new(state);
    let step = steps.fetch_add(1, Ordering::SeqCst) + 1;
    debug!(
        "Instance monitoring step {}: {} types changed",
        step,
        event.state.as_ref().map_or(0, |r| r.len())
    );
    // No subscribers is fine.
    let _ = events.send(event.clone());
    event
}

impl Drop for InstanceMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for InstanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceMonitor")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .field("steps", &self.steps_completed())
            .finish()
    }
}
