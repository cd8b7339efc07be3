//! Per-solve context.
//!
//! One `Environment` is constructed per solve and passed by reference to
//! every component; there is no process-wide state, so concurrent solves are
//! safe.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::bounds::BoundTracker;
use crate::ledger::IterationLedger;
use crate::settings::DualSettings;
use crate::timing::Timing;

/// Shared per-solve state: settings, iteration ledger, bounds and timers.
#[derive(Debug)]
pub struct Environment {
    /// Engine configuration.
    pub settings: DualSettings,

    /// Global bound state (internally synchronized).
    pub bounds: BoundTracker,

    ledger: Mutex<IterationLedger>,
    timing: Mutex<Timing>,
    solve_start: Instant,
}

impl Environment {
    /// Create a fresh environment for one solve.
    pub fn new(settings: DualSettings, is_minimization: bool) -> Self {
        Self {
            settings,
            bounds: BoundTracker::new(is_minimization),
            ledger: Mutex::new(IterationLedger::new()),
            timing: Mutex::new(Timing::new()),
            solve_start: Instant::now(),
        }
    }

    /// Lock the iteration ledger.
    pub fn ledger(&self) -> MutexGuard<'_, IterationLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the timing accumulators.
    pub fn timing(&self) -> MutexGuard<'_, Timing> {
        self.timing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seconds elapsed since the solve started.
    pub fn elapsed(&self) -> f64 {
        self.solve_start.elapsed().as_secs_f64()
    }

    /// Whether either configured gap tolerance is met.
    pub fn is_gap_met(&self) -> bool {
        self.bounds
            .is_absolute_gap_met(self.settings.absolute_gap_tolerance)
            || self
                .bounds
                .is_relative_gap_met(self.settings.relative_gap_tolerance)
    }

    /// Whether the outer iteration limit is reached.
    pub fn is_iteration_limit_reached(&self) -> bool {
        self.ledger().len() as u64 >= self.settings.iteration_limit
    }

    /// Whether the wall-clock time limit is reached.
    pub fn is_time_limit_reached(&self) -> bool {
        match self.settings.time_limit {
            Some(limit) => self.elapsed() >= limit,
            None => false,
        }
    }
}
