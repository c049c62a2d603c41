//! Periodic analysis of the live capture buffer.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, select};
use fcp_analysis::{WindowResult, WindowScanner};
use fcp_buffer::RingBuffer;

use crate::error::SessionError;

/// Outcome of one live tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    /// Seconds of audio captured when the tick ran.
    pub elapsed_sec: f64,
    /// `None` when the buffer held too little voiced audio.
    pub result: Option<WindowResult>,
}

/// Counters of the live analysis loop.
#[derive(Debug, Default)]
pub struct LiveStats {
    ticks: AtomicU64,
    omitted: AtomicU64,
    overruns: AtomicU64,
    failures: AtomicU64,
}

impl LiveStats {
    /// Ticks that ran an analysis pass.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Passes that produced no result.
    pub fn omitted(&self) -> u64 {
        self.omitted.load(Ordering::Relaxed)
    }

    /// Ticks skipped because the previous pass ran past its interval.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Passes that panicked.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Background thread that snapshots a [`RingBuffer`] on a fixed interval
/// and runs one window analysis per tick.
///
/// The thread owns the growing result sequence; [`LiveMonitor::join`] hands
/// it back once the thread has finished, so nobody observes it half built.
///
/// A pass that takes longer than the interval causes the following tick to
/// be skipped. Ticks never queue up.
pub struct LiveMonitor {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<Vec<WindowResult>>>,
    stats: Arc<LiveStats>,
}

impl LiveMonitor {
    /// Starts the analysis thread.
    ///
    /// Every tick's outcome is offered to `updates` without blocking; a
    /// full or disconnected channel drops the update.
    pub fn spawn(
        scanner: WindowScanner,
        buffer: RingBuffer<f32>,
        interval: Duration,
        updates: Option<Sender<LiveUpdate>>,
    ) -> Result<Self, SessionError> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let stats = Arc::new(LiveStats::default());

        let worker = Worker {
            scanner,
            buffer,
            interval,
            updates,
            stats: Arc::clone(&stats),
        };
        let handle = thread::Builder::new()
            .name("fcp-live".into())
            .spawn(move || worker.run(stop_rx))
            .map_err(|source| SessionError::Spawn {
                name: "live",
                source,
            })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
            stats,
        })
    }

    pub fn stats(&self) -> &Arc<LiveStats> {
        &self.stats
    }

    /// Stops the thread and returns every result it produced, oldest first.
    pub fn join(mut self) -> Result<Vec<WindowResult>, SessionError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<Vec<WindowResult>, SessionError> {
        let Some(handle) = self.handle.take() else {
            return Ok(Vec::new());
        };
        let _ = self.stop_tx.try_send(());
        handle
            .join()
            .map_err(|_| SessionError::WorkerPanicked("live"))
    }
}

impl Drop for LiveMonitor {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("live monitor: {e}");
        }
    }
}

struct Worker {
    scanner: WindowScanner,
    buffer: RingBuffer<f32>,
    interval: Duration,
    updates: Option<Sender<LiveUpdate>>,
    stats: Arc<LiveStats>,
}

impl Worker {
    fn run(self, stop_rx: Receiver<()>) -> Vec<WindowResult> {
        let ticker = crossbeam_channel::tick(self.interval);
        let mut snapshot = Vec::with_capacity(self.buffer.capacity());
        let mut results = Vec::new();
        let mut skip_next = false;

        tracing::debug!(interval = ?self.interval, "live: monitor started");
        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    if skip_next {
                        skip_next = false;
                        continue;
                    }
                    let started = Instant::now();
                    self.tick(&mut snapshot, &mut results);
                    let elapsed = started.elapsed();
                    if elapsed > self.interval {
                        skip_next = true;
                        let skipped = self.stats.overruns.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::warn!(
                            elapsed_ms = elapsed.as_millis() as u64,
                            interval_ms = self.interval.as_millis() as u64,
                            skipped,
                            "live: analysis overran its interval, skipping next tick"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            ticks = self.stats.ticks(),
            results = results.len(),
            overruns = self.stats.overruns(),
            failures = self.stats.failures(),
            "live: monitor stopped"
        );
        results
    }

    fn tick(&self, snapshot: &mut Vec<f32>, results: &mut Vec<WindowResult>) {
        let written = self.buffer.snapshot_into(snapshot);
        let fs = self.scanner.sample_rate() as f64;
        let elapsed_sec = written as f64 / fs;
        let start_sec = written.saturating_sub(snapshot.len() as u64) as f64 / fs;

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.scanner.analyze_window(snapshot, start_sec)
        }));
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);

        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(elapsed_sec, "live: analysis pass panicked");
                return;
            }
        };
        match &result {
            Some(w) => results.push(w.clone()),
            None => {
                self.stats.omitted.fetch_add(1, Ordering::Relaxed);
            }
        }
        if let Some(tx) = &self.updates {
            let _ = tx.try_send(LiveUpdate {
                elapsed_sec,
                result,
            });
        }
    }
}
