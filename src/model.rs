//! Problem-model interface and solution points.
//!
//! The algebraic model of the MINLP lives outside this crate; the engine only
//! needs constraint evaluation, gradients for linearization, and variable
//! metadata.

/// The most violated nonlinear constraint at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxDeviation {
    /// Index of the most violated nonlinear constraint.
    pub constraint: usize,

    /// Violation value (positive means infeasible).
    pub value: f64,
}

/// A candidate solution point, immutable once created.
#[derive(Debug, Clone)]
pub struct SolutionPoint {
    /// Variable values (dense, one per decision variable).
    pub point: Vec<f64>,

    /// Objective value of the original problem at this point.
    pub objective_value: f64,

    /// Most violated nonlinear constraint at this point.
    pub max_deviation: MaxDeviation,

    /// Outer iteration that produced this point.
    pub iter_found: u64,
}

impl SolutionPoint {
    /// Create a solution point, evaluating objective and deviation on the
    /// given model.
    pub fn evaluate(model: &dyn ProblemModel, point: Vec<f64>, iter_found: u64) -> Self {
        let max_deviation = model.most_deviating_constraint(&point);
        let objective_value = model.objective_value(&point);
        Self {
            point,
            objective_value,
            max_deviation,
            iter_found,
        }
    }

    /// Whether the point satisfies all nonlinear constraints within `tol`.
    pub fn is_feasible(&self, tol: f64) -> bool {
        self.max_deviation.value <= tol
    }
}

/// Interface to the nonlinear problem model.
///
/// Constraints are indexed `0..num_nonlinear_constraints()` and written in
/// the form `g_i(x) <= 0`; `constraint_value` returns `g_i(x)` so positive
/// values are violations.
pub trait ProblemModel {
    /// Number of decision variables.
    fn num_variables(&self) -> usize;

    /// Number of nonlinear constraints.
    fn num_nonlinear_constraints(&self) -> usize;

    /// Value of constraint `idx` at `point`.
    fn constraint_value(&self, idx: usize, point: &[f64]) -> f64;

    /// Sparse gradient of constraint `idx` at `point`.
    fn constraint_gradient(&self, idx: usize, point: &[f64]) -> Vec<(usize, f64)>;

    /// The most violated nonlinear constraint at `point`.
    fn most_deviating_constraint(&self, point: &[f64]) -> MaxDeviation {
        let mut max = MaxDeviation {
            constraint: 0,
            value: f64::NEG_INFINITY,
        };
        for idx in 0..self.num_nonlinear_constraints() {
            let value = self.constraint_value(idx, point);
            if value > max.value {
                max = MaxDeviation {
                    constraint: idx,
                    value,
                };
            }
        }
        max
    }

    /// Objective value of the original problem at `point`.
    fn objective_value(&self, point: &[f64]) -> f64;

    /// Lower and upper bound of variable `idx`.
    fn variable_bounds(&self, idx: usize) -> (f64, f64);

    /// Whether variable `idx` is discrete.
    fn is_discrete(&self, idx: usize) -> bool;

    /// Indices of all discrete variables.
    fn discrete_variable_indexes(&self) -> Vec<usize> {
        (0..self.num_variables())
            .filter(|&i| self.is_discrete(i))
            .collect()
    }

    /// Whether every discrete variable is binary (bounds within [0, 1]).
    fn all_discrete_binary(&self) -> bool {
        (0..self.num_variables()).filter(|&i| self.is_discrete(i)).all(|i| {
            let (lb, ub) = self.variable_bounds(i);
            lb >= 0.0 && ub <= 1.0
        })
    }

    /// Whether the objective is minimized.
    fn is_minimization(&self) -> bool {
        true
    }
}
