//! Infeasibility repair for the master problem.
//!
//! When the master relaxation becomes infeasible, a clone of it is re-solved
//! with slack columns on every repairable cut row. Later-added rows get
//! smaller penalties and are therefore relaxed more readily. Rows that
//! received slack are then permanently relaxed by 1.5 times the realized
//! slack value.

use crate::backend::{MasterBackend, MasterSolutionStatus, RowSense};
use crate::cuts::HyperplaneLog;
use crate::error::DualResult;
use crate::ledger::IterationLedger;

/// Slack multiplier applied when relaxing a repaired row.
const RELAXATION_FACTOR: f64 = 1.5;

/// Attempt to repair an infeasible master problem.
///
/// Returns `Ok(true)` when at least one row was relaxed, `Ok(false)` when no
/// repair was possible (no repairable rows, slack solve not optimal, or all
/// slacks zero). Never partially silent: zero repaired rows is always
/// reported as failure.
pub fn repair_infeasibility(
    backend: &mut dyn MasterBackend,
    log: &mut HyperplaneLog,
    ledger: &mut IterationLedger,
) -> DualResult<bool> {
    let rows = backend.repairable_rows();
    if rows.is_empty() {
        log::debug!("No repairable constraints, cannot repair infeasible master problem");
        return Ok(false);
    }

    // Deterministic penalties by insertion rank: 1/(rank+1)
    let weighted: Vec<(usize, f64)> = rows
        .iter()
        .enumerate()
        .map(|(rank, &row)| (row, 1.0 / (rank as f64 + 1.0)))
        .collect();

    let (status, slacks) = backend.solve_with_slack_relaxation(&weighted)?;

    if status != MasterSolutionStatus::Optimal {
        log::debug!(
            "Could not repair the infeasible master problem (slack solve status {:?})",
            status
        );
        return Ok(false);
    }

    let mut repaired = 0;

    for (&(row, _), &slack) in weighted.iter().zip(&slacks) {
        if slack == 0.0 {
            continue;
        }

        let delta = match backend.row_sense(row) {
            RowSense::Le => RELAXATION_FACTOR * slack,
            RowSense::Ge => -RELAXATION_FACTOR * slack,
        };

        backend.relax_row_bound(row, delta);
        log::debug!(
            "Constraint row {} repaired with infeasibility {}",
            row,
            RELAXATION_FACTOR * slack
        );

        // The relaxed cut is no longer the cut that was generated
        for generated in log.generated_mut() {
            if generated.row_index == Some(row) {
                generated.mark_removed();
            }
        }

        repaired += 1;
    }

    if repaired == 0 {
        log::debug!("Could not repair the infeasible master problem (all slacks zero)");
        return Ok(false);
    }

    log::info!("Infeasibility repair modified {} constraint(s)", repaired);

    if let Some(iter) = ledger.current_mut() {
        iter.repair_performed = true;
        iter.repaired_constraints = repaired;
    }

    Ok(true)
}
