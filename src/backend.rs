//! Backend solver traits.
//!
//! The engine never talks to a concrete MIP or NLP solver; everything it
//! needs from the branch-and-cut engine and the interior-point subsolver is
//! expressed through these traits.

use crate::error::DualResult;

/// Status reported by the master MIP/LP backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterSolutionStatus {
    /// Proven optimal solution.
    Optimal,

    /// An integer-feasible solution was found but not proven optimal
    /// (incumbents reported inside a running tree search).
    Feasible,

    /// Proven infeasible.
    Infeasible,

    /// Proven unbounded.
    Unbounded,

    /// Time limit reached.
    TimeLimit,

    /// Node limit reached.
    NodeLimit,

    /// Solution limit reached.
    SolutionLimit,

    /// Search was aborted.
    Abort,

    /// Solver-native error.
    Error,
}

impl MasterSolutionStatus {
    /// Whether the backend holds at least one usable solution point.
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            MasterSolutionStatus::Optimal
                | MasterSolutionStatus::Feasible
                | MasterSolutionStatus::TimeLimit
                | MasterSolutionStatus::NodeLimit
                | MasterSolutionStatus::SolutionLimit
        )
    }

    /// Whether the status is a normal limit-exhaustion outcome.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            MasterSolutionStatus::TimeLimit
                | MasterSolutionStatus::NodeLimit
                | MasterSolutionStatus::SolutionLimit
        )
    }
}

/// Status reported by the NLP backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NlpSolutionStatus {
    /// Locally optimal solution.
    Optimal,

    /// Feasible but not proven optimal.
    Feasible,

    /// Iteration limit reached.
    IterationLimit,

    /// Proven infeasible.
    Infeasible,

    /// Solver-native error.
    Error,
}

/// Sense of a linear row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// `terms . x <= rhs`
    Le,

    /// `terms . x >= rhs`
    Ge,
}

/// Interface to the master MIP/LP engine.
///
/// The backend owns the master-problem representation; the engine only adds
/// rows and columns, toggles discreteness, and reads solutions back.
pub trait MasterBackend {
    /// Enforce (`true`) or relax (`false`) the discrete variables.
    fn activate_discrete_variables(&mut self, activate: bool);

    /// Whether discrete variables are currently enforced.
    fn discrete_variables_active(&self) -> bool;

    /// Add a persistent linear constraint. Returns the new row index.
    fn add_linear_constraint(
        &mut self,
        terms: &[(usize, f64)],
        rhs: f64,
        sense: RowSense,
        repairable: bool,
    ) -> DualResult<usize>;

    /// Add a lazy constraint scoped to the running tree search
    /// (single-tree mode only).
    fn add_lazy_constraint(&mut self, terms: &[(usize, f64)], rhs: f64) -> DualResult<()>;

    /// Add a column for integer-cut auxiliaries. Returns the new variable
    /// index.
    fn add_column(&mut self, lb: f64, ub: f64, is_integer: bool) -> DualResult<usize>;

    /// Set the objective cutoff, given for the minimized form of the problem.
    fn set_cutoff(&mut self, value: f64);

    /// Set the solution limit for the next solve.
    fn set_solution_limit(&mut self, limit: u64);

    /// Current solution limit.
    fn solution_limit(&self) -> u64;

    /// Solve the current master problem.
    fn solve(&mut self) -> DualResult<MasterSolutionStatus>;

    /// Number of solutions available after the last solve.
    fn number_of_solutions(&self) -> usize;

    /// Variable values of solution `idx` from the pool (0 = best).
    fn variable_solution(&self, idx: usize) -> DualResult<Vec<f64>>;

    /// Objective value of solution `idx` from the pool.
    fn objective_value(&self, idx: usize) -> DualResult<f64>;

    /// Dual (bound-side) objective value of the last solve.
    fn dual_objective_value(&self) -> f64;

    /// Suggest a feasible point to the backend as a warm incumbent.
    fn push_incumbent(&mut self, point: &[f64]) -> DualResult<()>;

    // === Unbounded-relaxation workaround ===

    /// Temporarily drop objective terms that make the relaxation unbounded.
    fn remove_unbounded_objective_terms(&mut self) -> DualResult<()>;

    /// Restore objective terms removed by
    /// [`remove_unbounded_objective_terms`](Self::remove_unbounded_objective_terms).
    fn restore_objective_terms(&mut self) -> DualResult<()>;

    // === Infeasibility repair ===

    /// Row indices of all constraints flagged repairable, in insertion order.
    fn repairable_rows(&self) -> Vec<usize>;

    /// Sense of row `row`.
    fn row_sense(&self, row: usize) -> RowSense;

    /// Solve a clone of the master where each listed row gets a non-negative
    /// slack column with the given objective penalty. Returns the solve
    /// status and the realized slack values, one per listed row.
    fn solve_with_slack_relaxation(
        &mut self,
        rows: &[(usize, f64)],
    ) -> DualResult<(MasterSolutionStatus, Vec<f64>)>;

    /// Permanently shift the bound of row `row` by `delta`
    /// (`rhs += delta`).
    fn relax_row_bound(&mut self, row: usize, delta: f64);
}

/// Interface to the NLP engine used for fixed-integer primal improvement.
pub trait NlpBackend {
    /// Solve the current NLP instance.
    fn solve_problem_instance(&mut self) -> NlpSolutionStatus;

    /// Solution point of the last solve.
    fn solution(&self) -> Vec<f64>;

    /// Objective value of the last solve.
    fn objective_value(&self) -> f64;

    /// Set a starting point for the listed variables.
    fn set_starting_point(&mut self, indexes: &[usize], values: &[f64]);

    /// Fix the listed variables to the given values.
    fn fix_variables(&mut self, indexes: &[usize], values: &[f64]);

    /// Release all fixed variables.
    fn unfix_variables(&mut self);
}
