//! Background polling loop that enforces the blacklist
//!
//! [`ProcessMonitor`] owns at most one loop thread. `stop()` only signals the
//! thread; `wait()` joins it. Each iteration reads a fresh [`ListSnapshot`]
//! from the shared store, so list edits take effect on the next pass.

use crate::constants::DEFAULT_POLL_INTERVAL;
use crate::models::{IterationReport, MonitorStats, StartOutcome, StopOutcome, TerminationEvent};
use crate::monitor::core;
use crate::output::create_termination_event;
use crate::process::ProcessActuator;
use crate::store::{ListSnapshot, SharedStore};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll period used by `run_until` to check the interrupt flag
const INTERRUPT_CHECK_INTERVAL: Duration = Duration::from_millis(100);

struct Worker {
    /// Dropping the sender wakes the loop and ends it
    shutdown: Option<Sender<()>>,
    handle: JoinHandle<()>,
}

/// Everything the loop thread needs, cloned out of the monitor
#[derive(Clone)]
struct LoopContext {
    store: SharedStore,
    actuator: Arc<dyn ProcessActuator>,
    interval: Duration,
    stats: Arc<Mutex<MonitorStats>>,
    events: Option<Sender<TerminationEvent>>,
    running: Arc<AtomicBool>,
}

impl LoopContext {
    fn snapshot(&self) -> ListSnapshot {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    fn iterate(&self) -> IterationReport {
        let lists = self.snapshot();
        let report = core::run_iteration(self.actuator.as_ref(), &lists);
        self.record(&report);
        report
    }

    fn record(&self, report: &IterationReport) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.iterations += 1;
        stats.terminated += report.terminated.len() as u64;
        stats.vanished += report.vanished as u64;
        stats.refused += report.refused as u64;
        drop(stats);

        if let Some(events) = &self.events {
            for process in &report.terminated {
                // A dropped receiver just means nobody is listening
                let _ = events.send(create_termination_event(process));
            }
        }
    }
}

/// Start/stop-able blacklist enforcement service
pub struct ProcessMonitor {
    ctx: LoopContext,
    worker: Mutex<Option<Worker>>,
}

impl ProcessMonitor {
    pub fn new(store: SharedStore, actuator: Arc<dyn ProcessActuator>) -> Self {
        Self {
            ctx: LoopContext {
                store,
                actuator,
                interval: DEFAULT_POLL_INTERVAL,
                stats: Arc::new(Mutex::new(MonitorStats::default())),
                events: None,
                running: Arc::new(AtomicBool::new(false)),
            },
            worker: Mutex::new(None),
        }
    }

    /// Delay between two iterations (default 2s)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.ctx.interval = interval;
        self
    }

    /// Receive a [`TerminationEvent`] for every successful termination
    pub fn with_event_sender(mut self, sender: Sender<TerminationEvent>) -> Self {
        self.ctx.events = Some(sender);
        self
    }

    pub fn interval(&self) -> Duration {
        self.ctx.interval
    }

    pub fn is_running(&self) -> bool {
        self.ctx.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> MonitorStats {
        *self.ctx.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the loop thread unless one is already running. A loop that was
    /// stopped but has not exited yet is joined first, so two loops never overlap.
    pub fn start(&self) -> StartOutcome {
        let mut worker = self.worker();

        if self.is_running() {
            return StartOutcome::AlreadyRunning;
        }

        if let Some(previous) = worker.take() {
            join_worker(previous);
        }

        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let ctx = self.ctx.clone();
        ctx.running.store(true, Ordering::SeqCst);

        let handle = thread::spawn(move || poll_loop(ctx, shutdown_rx));

        self.ctx.stats.lock().unwrap_or_else(PoisonError::into_inner).runs += 1;
        *worker = Some(Worker {
            shutdown: Some(shutdown_tx),
            handle,
        });
        info!(
            "Process monitoring started (interval: {:.1}s)",
            self.ctx.interval.as_secs_f64()
        );
        StartOutcome::Started
    }

    /// Request the loop to stop. Returns immediately; use [`wait`](Self::wait)
    /// to block until the thread has exited.
    pub fn stop(&self) -> StopOutcome {
        let mut worker = self.worker();

        let signalled = worker
            .as_mut()
            .and_then(|w| w.shutdown.take())
            .is_some();
        self.ctx.running.store(false, Ordering::SeqCst);

        if signalled {
            info!("Process monitoring stop requested");
            StopOutcome::StopRequested
        } else {
            StopOutcome::NotRunning
        }
    }

    /// Block until a stopped loop has fully exited. Does nothing if the loop
    /// was never started or is still running.
    pub fn wait(&self) {
        let mut worker = self.worker();

        let stopped = matches!(worker.as_ref(), Some(w) if w.shutdown.is_none());
        if stopped {
            if let Some(previous) = worker.take() {
                join_worker(previous);
            }
        }
    }

    pub fn stop_and_wait(&self) -> StopOutcome {
        let outcome = self.stop();
        self.wait();
        outcome
    }

    /// Run one iteration on the calling thread, outside the loop
    pub fn run_once(&self) -> IterationReport {
        self.ctx.iterate()
    }
}

impl Drop for ProcessMonitor {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}

fn join_worker(worker: Worker) {
    drop(worker.shutdown);
    if worker.handle.join().is_err() {
        error!("Monitor thread panicked");
    }
}

fn poll_loop(ctx: LoopContext, shutdown: Receiver<()>) {
    info!("Background monitoring loop active");

    loop {
        // Only stop() ends the loop; a panicking iteration is counted and retried
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ctx.iterate()));
        if result.is_err() {
            error!("Monitor iteration panicked, retrying after {:.1}s", ctx.interval.as_secs_f64());
            ctx.stats.lock().unwrap_or_else(PoisonError::into_inner).panics += 1;
        }

        match shutdown.recv_timeout(ctx.interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    info!("Background monitoring loop terminated");
}

/// Start `monitor`, block until `interrupted` is set, then stop and join it.
/// Used by the CLI with a signal-hook flag.
pub fn run_until(monitor: &ProcessMonitor, interrupted: &AtomicBool) -> StartOutcome {
    let outcome = monitor.start();
    if outcome == StartOutcome::AlreadyRunning {
        return outcome;
    }

    while !interrupted.load(Ordering::Relaxed) && monitor.is_running() {
        thread::sleep(INTERRUPT_CHECK_INTERVAL);
    }

    monitor.stop_and_wait();
    outcome
}
