//! Append-only record of solved iterations.

use crate::backend::MasterSolutionStatus;
use crate::model::MaxDeviation;

/// Which form of the master problem an iteration solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    /// Continuous relaxation (discrete variables free).
    Relaxed,

    /// Full discrete master problem.
    DiscreteMaster,
}

/// Record of one outer-loop pass or one accepted single-tree candidate.
#[derive(Debug, Clone)]
pub struct Iteration {
    /// Sequence number, starting at 1.
    pub number: u64,

    /// Problem form solved in this iteration.
    pub kind: IterationKind,

    /// Status of the master solve, once known.
    pub solution_status: Option<MasterSolutionStatus>,

    /// Objective value of the representative point.
    pub objective_value: f64,

    /// Max constraint deviation of the representative point.
    pub max_deviation: Option<MaxDeviation>,

    /// `(dualBound, primalBound)` at iteration creation.
    pub bounds_at_creation: (f64, f64),

    /// Hyperplanes added in this iteration.
    pub hyperplanes_added: usize,

    /// Integer cuts added in this iteration.
    pub integer_cuts_added: usize,

    /// Whether an infeasibility repair ran in this iteration.
    pub repair_performed: bool,

    /// Number of constraint rows modified by the repair.
    pub repaired_constraints: usize,
}

/// Append-only ledger of iterations. Iterations are never deleted.
#[derive(Debug, Default)]
pub struct IterationLedger {
    iterations: Vec<Iteration>,
    total_hyperplanes: usize,
    total_integer_cuts: usize,
}

impl IterationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new iteration and return its sequence number.
    pub fn create_iteration(&mut self, kind: IterationKind, bounds: (f64, f64)) -> u64 {
        let number = self.iterations.len() as u64 + 1;
        self.iterations.push(Iteration {
            number,
            kind,
            solution_status: None,
            objective_value: f64::NAN,
            max_deviation: None,
            bounds_at_creation: bounds,
            hyperplanes_added: 0,
            integer_cuts_added: 0,
            repair_performed: false,
            repaired_constraints: 0,
        });
        number
    }

    /// The most recent iteration, if any.
    pub fn current(&self) -> Option<&Iteration> {
        self.iterations.last()
    }

    /// Mutable access to the most recent iteration.
    pub fn current_mut(&mut self) -> Option<&mut Iteration> {
        self.iterations.last_mut()
    }

    /// The iteration before the current one.
    pub fn previous(&self) -> Option<&Iteration> {
        let len = self.iterations.len();
        if len >= 2 {
            self.iterations.get(len - 2)
        } else {
            None
        }
    }

    /// Iteration by sequence number.
    pub fn get(&self, number: u64) -> Option<&Iteration> {
        if number == 0 {
            return None;
        }
        self.iterations.get(number as usize - 1)
    }

    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    /// Record hyperplanes added to the current iteration.
    pub fn count_hyperplanes(&mut self, count: usize) {
        if let Some(iter) = self.iterations.last_mut() {
            iter.hyperplanes_added += count;
        }
        self.total_hyperplanes += count;
    }

    /// Record integer cuts added to the current iteration.
    pub fn count_integer_cuts(&mut self, count: usize) {
        if let Some(iter) = self.iterations.last_mut() {
            iter.integer_cuts_added += count;
        }
        self.total_integer_cuts += count;
    }

    /// Cumulative hyperplane count across all iterations.
    pub fn total_hyperplanes(&self) -> usize {
        self.total_hyperplanes
    }

    /// Cumulative integer-cut count across all iterations.
    pub fn total_integer_cuts(&self) -> usize {
        self.total_integer_cuts
    }
}
