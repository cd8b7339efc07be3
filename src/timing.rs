//! Named wall-clock timers.
//!
//! The relaxation strategy swaps between the "LP" and "MIP" accumulators when
//! the master problem changes form; both operations are idempotent so the
//! strategy can re-assert its state freely.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Timer {
    accumulated: Duration,
    started: Option<Instant>,
}

/// A set of named timing accumulators.
#[derive(Debug, Default)]
pub struct Timing {
    timers: HashMap<String, Timer>,
}

impl Timing {
    /// Create an empty timer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the named timer. Starting a running timer is a
    /// no-op.
    pub fn start(&mut self, name: &str) {
        let timer = self.timers.entry(name.to_string()).or_default();
        if timer.started.is_none() {
            timer.started = Some(Instant::now());
        }
    }

    /// Stop the named timer, folding the elapsed interval into its
    /// accumulator. Stopping a stopped or unknown timer is a no-op.
    pub fn stop(&mut self, name: &str) {
        if let Some(timer) = self.timers.get_mut(name) {
            if let Some(started) = timer.started.take() {
                timer.accumulated += started.elapsed();
            }
        }
    }

    /// Total elapsed seconds for the named timer, including a running
    /// interval.
    pub fn elapsed(&self, name: &str) -> f64 {
        match self.timers.get(name) {
            Some(timer) => {
                let running = timer
                    .started
                    .map(|s| s.elapsed())
                    .unwrap_or(Duration::ZERO);
                (timer.accumulated + running).as_secs_f64()
            }
            None => 0.0,
        }
    }

    /// Whether the named timer is currently running.
    pub fn is_running(&self, name: &str) -> bool {
        self.timers
            .get(name)
            .map(|t| t.started.is_some())
            .unwrap_or(false)
    }
}
