// src/core/scheduler.rs
//
// Fixed-rate wall-clock tick loop with a cooperative shutdown flag, plus
// per-tick timing statistics.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

/// Process-wide shutdown request, set from the signal handler
static SHUTDOWN_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

pub fn shutdown_flag() -> Arc<AtomicBool> {
    SHUTDOWN_FLAG
        .get_or_init(|| Arc::new(AtomicBool::new(false)))
        .clone()
}

pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::SeqCst);
}

pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::SeqCst)
}

/// Sleeps to evenly spaced deadlines and reports session time in seconds.
///
/// A tick that overruns its slot is not made up: the next deadline is
/// rescheduled from the current time and the miss is counted.
#[derive(Debug)]
pub struct Ticker {
    interval: Duration,
    start: Instant,
    next: Instant,
    ticks: u64,
    missed: u64,
    shutdown: Arc<AtomicBool>,
}

impl Ticker {
    pub fn new(interval_secs: f64, shutdown: Arc<AtomicBool>) -> Self {
        let interval = Duration::from_secs_f64(interval_secs.max(1e-6));
        let start = Instant::now();
        Self {
            interval,
            start,
            next: start,
            ticks: 0,
            missed: 0,
            shutdown,
        }
    }

    /// Block until the next deadline. `None` once shutdown is requested.
    pub fn wait(&mut self) -> Option<f64> {
        if self.shutdown.load(Ordering::SeqCst) {
            return None;
        }

        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        }

        let now = Instant::now();
        self.next += self.interval;
        if self.next < now {
            self.missed += 1;
            self.next = now + self.interval;
        }
        self.ticks += 1;

        Some(now.duration_since(self.start).as_secs_f64())
    }

    /// Call `tick` with the session time at every deadline until it breaks
    /// or shutdown is requested.
    pub fn run<F>(&mut self, mut tick: F)
    where
        F: FnMut(f64) -> ControlFlow<()>,
    {
        while let Some(now) = self.wait() {
            if tick(now).is_break() {
                break;
            }
        }
        debug!(
            "tick loop ended after {} ticks ({} missed deadlines)",
            self.ticks, self.missed
        );
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn missed(&self) -> u64 {
        self.missed
    }

    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Running tick-time statistics against a per-tick budget
#[derive(Debug, Clone, Default)]
pub struct TickStats {
    pub ticks: u64,
    pub total: Duration,
    pub max: Duration,
    pub over_budget: u64,
    budget: Duration,
}

impl TickStats {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    pub fn record(&mut self, spent: Duration) {
        self.ticks += 1;
        self.total += spent;
        self.max = self.max.max(spent);
        if spent > self.budget {
            self.over_budget += 1;
        }
    }

    /// Time `f` and record it
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let result = f();
        self.record(started.elapsed());
        result
    }

    pub fn mean_us(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1e6 / self.ticks as f64
        }
    }

    pub fn max_us(&self) -> f64 {
        self.max.as_secs_f64() * 1e6
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}
