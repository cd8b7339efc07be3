//! Integer (no-good) cut generation.
//!
//! Excludes one rejected discrete assignment from the master problem. The
//! all-binary case needs a single row; general integers require a big-M
//! disjunction per variable strictly between its bounds so that neighboring
//! integer points stay feasible.

use crate::backend::{MasterBackend, RowSense};
use crate::error::DualResult;
use crate::model::ProblemModel;
use crate::settings::DualSettings;

/// The discrete assignment of a rejected candidate.
#[derive(Debug, Clone)]
pub struct IntegerCut {
    /// Indices of the discrete variables.
    pub variable_indexes: Vec<usize>,

    /// Rejected (integral) values, aligned with `variable_indexes`.
    pub variable_values: Vec<i64>,

    /// Whether every discrete variable is binary.
    pub all_variables_binary: bool,
}

impl IntegerCut {
    /// Build a cut request from the discrete part of a rejected point.
    pub fn from_point(model: &dyn ProblemModel, point: &[f64]) -> Self {
        let variable_indexes = model.discrete_variable_indexes();
        let variable_values = variable_indexes
            .iter()
            .map(|&i| point[i].round() as i64)
            .collect();

        Self {
            variable_indexes,
            variable_values,
            all_variables_binary: model.all_discrete_binary(),
        }
    }
}

/// Add a no-good cut excluding the given assignment to the master problem.
///
/// Returns `Ok(false)` without adding anything when a fixed value lies
/// outside the variable's current bounds (a stale cut request) or when the
/// binary flag does not match the values seen.
pub fn create_integer_cut(
    model: &dyn ProblemModel,
    backend: &mut dyn MasterBackend,
    settings: &DualSettings,
    cut: &IntegerCut,
) -> DualResult<bool> {
    // A value outside the current bounds marks the request as stale
    for (&idx, &value) in cut.variable_indexes.iter().zip(&cut.variable_values) {
        let (lb, ub) = model.variable_bounds(idx);
        if (value as f64) < lb || (value as f64) > ub {
            log::debug!(
                "Integer cut not added: variable {} fixed at {} outside [{}, {}]",
                idx,
                value,
                lb,
                ub
            );
            return Ok(false);
        }
    }

    if cut.all_variables_binary {
        create_binary_cut(backend, settings, cut)
    } else {
        create_general_cut(model, backend, settings, cut)
    }
}

/// Binary no-good: `sum_{v=1} x_i - sum_{v=0} x_i <= (#ones) - 1`.
fn create_binary_cut(
    backend: &mut dyn MasterBackend,
    settings: &DualSettings,
    cut: &IntegerCut,
) -> DualResult<bool> {
    let mut terms = Vec::with_capacity(cut.variable_indexes.len());
    let mut ones = 0i64;

    for (&idx, &value) in cut.variable_indexes.iter().zip(&cut.variable_values) {
        match value {
            1 => {
                terms.push((idx, 1.0));
                ones += 1;
            }
            0 => terms.push((idx, -1.0)),
            _ => {
                log::debug!("Integer cut not added: non-binary value {} in binary cut", value);
                return Ok(false);
            }
        }
    }

    backend.add_linear_constraint(
        &terms,
        ones as f64 - 1.0,
        RowSense::Le,
        settings.integer_cut_repair,
    )?;

    Ok(true)
}

/// General-integer no-good via big-M disjunctions.
fn create_general_cut(
    model: &dyn ProblemModel,
    backend: &mut dyn MasterBackend,
    settings: &DualSettings,
    cut: &IntegerCut,
) -> DualResult<bool> {
    let mut aggregate = Vec::new();
    let mut sum_lb = 0.0;
    let mut sum_ub = 0.0;

    for (&idx, &value) in cut.variable_indexes.iter().zip(&cut.variable_values) {
        let (lb, ub) = model.variable_bounds(idx);
        let value = value as f64;

        if value == ub {
            sum_ub += ub;
            aggregate.push((idx, -1.0));
        } else if value == lb {
            sum_lb -= lb;
            aggregate.push((idx, 1.0));
        } else {
            // Strictly interior value: w >= |x - value| via an auxiliary
            // continuous column w and a binary selector v
            let w = backend.add_column(0.0, f64::INFINITY, false)?;
            let v = backend.add_column(0.0, 1.0, true)?;

            let m1 = 2.0 * (value - lb);
            let m2 = 2.0 * (ub - value);

            // x + w >= value
            backend.add_linear_constraint(&[(idx, 1.0), (w, 1.0)], value, RowSense::Ge, false)?;

            // x - w <= value
            backend.add_linear_constraint(&[(idx, 1.0), (w, -1.0)], value, RowSense::Le, false)?;

            // w - x + M1 v <= -value + M1
            backend.add_linear_constraint(
                &[(w, 1.0), (idx, -1.0), (v, m1)],
                -value + m1,
                RowSense::Le,
                false,
            )?;

            // w + x - M2 v <= value
            backend.add_linear_constraint(
                &[(w, 1.0), (idx, 1.0), (v, -m2)],
                value,
                RowSense::Le,
                false,
            )?;

            aggregate.push((w, 1.0));
        }
    }

    backend.add_linear_constraint(
        &aggregate,
        1.0 - sum_lb - sum_ub,
        RowSense::Ge,
        settings.integer_cut_repair,
    )?;

    Ok(true)
}
