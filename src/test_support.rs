//! Shared stubs for unit tests.

use crate::backend::{
    MasterBackend, MasterSolutionStatus, NlpBackend, NlpSolutionStatus, RowSense,
};
use crate::error::{DualError, DualResult};
use crate::model::ProblemModel;

/// A recorded linear row.
#[derive(Debug, Clone)]
pub struct StubRow {
    pub terms: Vec<(usize, f64)>,
    pub rhs: f64,
    pub sense: RowSense,
    pub repairable: bool,
}

/// Scripted result for one `solve` call.
#[derive(Debug, Clone)]
pub struct SolveScript {
    pub status: MasterSolutionStatus,
    pub solutions: Vec<Vec<f64>>,
    pub objectives: Vec<f64>,
    pub dual_objective: f64,
}

/// Recording master backend with scriptable solve results.
#[derive(Debug)]
pub struct StubMasterBackend {
    pub num_vars: usize,
    pub discrete_active: bool,
    pub rows: Vec<StubRow>,
    pub lazy_rows: Vec<(Vec<(usize, f64)>, f64)>,
    pub columns_added: usize,
    pub cutoffs: Vec<f64>,
    pub pushed_incumbents: Vec<Vec<f64>>,
    pub solution_limit: u64,
    pub fail_lazy: bool,

    pub solve_queue: Vec<SolveScript>,
    pub current_solve: Option<SolveScript>,

    pub slack_solution: Option<(MasterSolutionStatus, Vec<f64>)>,
    pub last_slack_request: Vec<(usize, f64)>,
    pub relaxed_rows: Vec<(usize, f64)>,

    pub unbounded_terms_removed: bool,
}

impl StubMasterBackend {
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            discrete_active: true,
            rows: Vec::new(),
            lazy_rows: Vec::new(),
            columns_added: 0,
            cutoffs: Vec::new(),
            pushed_incumbents: Vec::new(),
            solution_limit: u64::MAX,
            fail_lazy: false,
            solve_queue: Vec::new(),
            current_solve: None,
            slack_solution: None,
            last_slack_request: Vec::new(),
            relaxed_rows: Vec::new(),
            unbounded_terms_removed: false,
        }
    }

    pub fn script(&mut self, script: SolveScript) {
        self.solve_queue.push(script);
    }
}

impl MasterBackend for StubMasterBackend {
    fn activate_discrete_variables(&mut self, activate: bool) {
        self.discrete_active = activate;
    }

    fn discrete_variables_active(&self) -> bool {
        self.discrete_active
    }

    fn add_linear_constraint(
        &mut self,
        terms: &[(usize, f64)],
        rhs: f64,
        sense: RowSense,
        repairable: bool,
    ) -> DualResult<usize> {
        self.rows.push(StubRow {
            terms: terms.to_vec(),
            rhs,
            sense,
            repairable,
        });
        Ok(self.rows.len() - 1)
    }

    fn add_lazy_constraint(&mut self, terms: &[(usize, f64)], rhs: f64) -> DualResult<()> {
        if self.fail_lazy {
            return Err(DualError::MasterBackend("lazy constraints rejected".into()));
        }
        self.lazy_rows.push((terms.to_vec(), rhs));
        Ok(())
    }

    fn add_column(&mut self, _lb: f64, _ub: f64, _is_integer: bool) -> DualResult<usize> {
        let idx = self.num_vars + self.columns_added;
        self.columns_added += 1;
        Ok(idx)
    }

    fn set_cutoff(&mut self, value: f64) {
        self.cutoffs.push(value);
    }

    fn set_solution_limit(&mut self, limit: u64) {
        self.solution_limit = limit;
    }

    fn solution_limit(&self) -> u64 {
        self.solution_limit
    }

    fn solve(&mut self) -> DualResult<MasterSolutionStatus> {
        if self.solve_queue.is_empty() {
            return Ok(MasterSolutionStatus::Error);
        }
        let script = self.solve_queue.remove(0);
        let status = script.status;
        self.current_solve = Some(script);
        Ok(status)
    }

    fn number_of_solutions(&self) -> usize {
        self.current_solve
            .as_ref()
            .map(|s| s.solutions.len())
            .unwrap_or(0)
    }

    fn variable_solution(&self, idx: usize) -> DualResult<Vec<f64>> {
        self.current_solve
            .as_ref()
            .and_then(|s| s.solutions.get(idx))
            .cloned()
            .ok_or_else(|| DualError::MasterBackend("no such solution".into()))
    }

    fn objective_value(&self, idx: usize) -> DualResult<f64> {
        self.current_solve
            .as_ref()
            .and_then(|s| s.objectives.get(idx))
            .copied()
            .ok_or_else(|| DualError::MasterBackend("no such solution".into()))
    }

    fn dual_objective_value(&self) -> f64 {
        self.current_solve
            .as_ref()
            .map(|s| s.dual_objective)
            .unwrap_or(f64::NEG_INFINITY)
    }

    fn push_incumbent(&mut self, point: &[f64]) -> DualResult<()> {
        self.pushed_incumbents.push(point.to_vec());
        Ok(())
    }

    fn remove_unbounded_objective_terms(&mut self) -> DualResult<()> {
        self.unbounded_terms_removed = true;
        Ok(())
    }

    fn restore_objective_terms(&mut self) -> DualResult<()> {
        self.unbounded_terms_removed = false;
        Ok(())
    }

    fn repairable_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.repairable)
            .map(|(i, _)| i)
            .collect()
    }

    fn row_sense(&self, row: usize) -> RowSense {
        self.rows[row].sense
    }

    fn solve_with_slack_relaxation(
        &mut self,
        rows: &[(usize, f64)],
    ) -> DualResult<(MasterSolutionStatus, Vec<f64>)> {
        self.last_slack_request = rows.to_vec();
        Ok(self
            .slack_solution
            .clone()
            .unwrap_or((MasterSolutionStatus::Optimal, vec![0.0; rows.len()])))
    }

    fn relax_row_bound(&mut self, row: usize, delta: f64) {
        self.rows[row].rhs += delta;
        self.relaxed_rows.push((row, delta));
    }
}

/// One continuous variable, `g(x) = x^2 - 2 <= 0`, objective `-x` on [0, 2].
pub struct QuadraticModel {
    nan_gradient_above: Option<f64>,
}

impl QuadraticModel {
    pub fn new_1d() -> Self {
        Self {
            nan_gradient_above: None,
        }
    }

    pub fn with_nan_gradient() -> Self {
        Self {
            nan_gradient_above: Some(f64::NEG_INFINITY),
        }
    }

    pub fn with_nan_gradient_above(threshold: f64) -> Self {
        Self {
            nan_gradient_above: Some(threshold),
        }
    }
}

impl ProblemModel for QuadraticModel {
    fn num_variables(&self) -> usize {
        1
    }

    fn num_nonlinear_constraints(&self) -> usize {
        1
    }

    fn constraint_value(&self, _idx: usize, point: &[f64]) -> f64 {
        point[0] * point[0] - 2.0
    }

    fn constraint_gradient(&self, _idx: usize, point: &[f64]) -> Vec<(usize, f64)> {
        if let Some(threshold) = self.nan_gradient_above {
            if point[0] > threshold {
                return vec![(0, f64::NAN)];
            }
        }
        vec![(0, 2.0 * point[0])]
    }

    fn objective_value(&self, point: &[f64]) -> f64 {
        -point[0]
    }

    fn variable_bounds(&self, _idx: usize) -> (f64, f64) {
        (0.0, 2.0)
    }

    fn is_discrete(&self, _idx: usize) -> bool {
        false
    }
}

/// Two continuous variables with `x0^2 - 2 <= 0` and `x1^2 - 3 <= 0`.
pub struct TwoConstraintModel;

impl TwoConstraintModel {
    pub fn new() -> Self {
        Self
    }
}

impl ProblemModel for TwoConstraintModel {
    fn num_variables(&self) -> usize {
        2
    }

    fn num_nonlinear_constraints(&self) -> usize {
        2
    }

    fn constraint_value(&self, idx: usize, point: &[f64]) -> f64 {
        match idx {
            0 => point[0] * point[0] - 2.0,
            _ => point[1] * point[1] - 3.0,
        }
    }

    fn constraint_gradient(&self, idx: usize, point: &[f64]) -> Vec<(usize, f64)> {
        match idx {
            0 => vec![(0, 2.0 * point[0])],
            _ => vec![(1, 2.0 * point[1])],
        }
    }

    fn objective_value(&self, point: &[f64]) -> f64 {
        -point[0] - point[1]
    }

    fn variable_bounds(&self, _idx: usize) -> (f64, f64) {
        (0.0, 2.0)
    }

    fn is_discrete(&self, _idx: usize) -> bool {
        false
    }
}

/// All-binary model without nonlinear structure, for integer-cut tests.
pub struct BinaryModel {
    n: usize,
}

impl BinaryModel {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl ProblemModel for BinaryModel {
    fn num_variables(&self) -> usize {
        self.n
    }

    fn num_nonlinear_constraints(&self) -> usize {
        0
    }

    fn constraint_value(&self, _idx: usize, _point: &[f64]) -> f64 {
        0.0
    }

    fn constraint_gradient(&self, _idx: usize, _point: &[f64]) -> Vec<(usize, f64)> {
        Vec::new()
    }

    fn objective_value(&self, point: &[f64]) -> f64 {
        point.iter().sum()
    }

    fn variable_bounds(&self, _idx: usize) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn is_discrete(&self, _idx: usize) -> bool {
        true
    }
}

/// Scripted NLP backend recording fix/unfix calls.
#[derive(Debug)]
pub struct StubNlpBackend {
    pub status: NlpSolutionStatus,
    pub solution: Vec<f64>,
    pub objective: f64,
    pub fixed: Vec<(Vec<usize>, Vec<f64>)>,
    pub starting_points: Vec<Vec<f64>>,
    pub unfix_calls: usize,
    pub solve_calls: usize,
}

impl StubNlpBackend {
    pub fn new(status: NlpSolutionStatus, solution: Vec<f64>) -> Self {
        Self {
            status,
            solution,
            objective: 0.0,
            fixed: Vec::new(),
            starting_points: Vec::new(),
            unfix_calls: 0,
            solve_calls: 0,
        }
    }
}

impl NlpBackend for StubNlpBackend {
    fn solve_problem_instance(&mut self) -> NlpSolutionStatus {
        self.solve_calls += 1;
        self.status
    }

    fn solution(&self) -> Vec<f64> {
        self.solution.clone()
    }

    fn objective_value(&self) -> f64 {
        self.objective
    }

    fn set_starting_point(&mut self, _indexes: &[usize], values: &[f64]) {
        self.starting_points.push(values.to_vec());
    }

    fn fix_variables(&mut self, indexes: &[usize], values: &[f64]) {
        self.fixed.push((indexes.to_vec(), values.to_vec()));
    }

    fn unfix_variables(&mut self) {
        self.unfix_calls += 1;
    }
}

/// One binary variable `x0` and one continuous variable `x1` in [0, 2] with
/// `x1^2 - 2 <= 0` and objective `-x0 - x1`.
pub struct MixedBinaryModel;

impl MixedBinaryModel {
    pub fn new() -> Self {
        Self
    }
}

impl ProblemModel for MixedBinaryModel {
    fn num_variables(&self) -> usize {
        2
    }

    fn num_nonlinear_constraints(&self) -> usize {
        1
    }

    fn constraint_value(&self, _idx: usize, point: &[f64]) -> f64 {
        point[1] * point[1] - 2.0
    }

    fn constraint_gradient(&self, _idx: usize, point: &[f64]) -> Vec<(usize, f64)> {
        vec![(1, 2.0 * point[1])]
    }

    fn objective_value(&self, point: &[f64]) -> f64 {
        -point[0] - point[1]
    }

    fn variable_bounds(&self, idx: usize) -> (f64, f64) {
        if idx == 0 {
            (0.0, 1.0)
        } else {
            (0.0, 2.0)
        }
    }

    fn is_discrete(&self, idx: usize) -> bool {
        idx == 0
    }
}

/// One general integer variable with the given bounds.
pub struct BoundedIntegerModel {
    lb: f64,
    ub: f64,
}

impl BoundedIntegerModel {
    pub fn new(lb: f64, ub: f64) -> Self {
        Self { lb, ub }
    }
}

impl ProblemModel for BoundedIntegerModel {
    fn num_variables(&self) -> usize {
        1
    }

    fn num_nonlinear_constraints(&self) -> usize {
        0
    }

    fn constraint_value(&self, _idx: usize, _point: &[f64]) -> f64 {
        0.0
    }

    fn constraint_gradient(&self, _idx: usize, _point: &[f64]) -> Vec<(usize, f64)> {
        Vec::new()
    }

    fn objective_value(&self, point: &[f64]) -> f64 {
        point[0]
    }

    fn variable_bounds(&self, _idx: usize) -> (f64, f64) {
        (self.lb, self.ub)
    }

    fn is_discrete(&self, _idx: usize) -> bool {
        true
    }
}
