//! Solution-based hyperplane selection (ECP).
//!
//! Linearizes the most violated nonlinear constraints directly at each
//! candidate point.

use super::{Hyperplane, HyperplaneLog, HyperplaneSource, RegisterOutcome};
use crate::backend::MasterBackend;
use crate::model::{ProblemModel, SolutionPoint};
use crate::settings::DualSettings;

/// Pick the constraints to linearize at `point`: the most violated one plus
/// any other violated constraint whose deviation is at least
/// `constraint_selection_fraction` of the maximum, capped at
/// `max_constraints_per_point`. Sorted by decreasing violation.
pub(crate) fn select_violated_constraints(
    settings: &DualSettings,
    model: &dyn ProblemModel,
    point: &[f64],
) -> Vec<(usize, f64)> {
    let mut violated: Vec<(usize, f64)> = (0..model.num_nonlinear_constraints())
        .map(|idx| (idx, model.constraint_value(idx, point)))
        .filter(|&(_, value)| value > settings.term_tolerance)
        .collect();

    violated.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if let Some(&(_, max_violation)) = violated.first() {
        let threshold = settings.constraint_selection_fraction * max_violation;
        violated.retain(|&(_, value)| value >= threshold);
    }

    violated.truncate(settings.max_constraints_per_point);
    violated
}

/// Statistics for the solution-based selector.
#[derive(Debug, Default, Clone)]
pub struct SolutionPointStats {
    /// Hyperplanes added.
    pub cuts_added: usize,

    /// Candidate points skipped as already feasible.
    pub feasible_points_skipped: usize,
}

/// Solution-based (ECP) hyperplane selector.
#[derive(Debug, Default)]
pub struct SolutionPointSelector {
    stats: SolutionPointStats,
}

impl SolutionPointSelector {
    /// Create the selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate hyperplanes for the candidate points. Returns the number of
    /// cuts added.
    pub fn run(
        &mut self,
        settings: &DualSettings,
        model: &dyn ProblemModel,
        backend: &mut dyn MasterBackend,
        log: &mut HyperplaneLog,
        candidates: &[SolutionPoint],
        lazy: bool,
    ) -> usize {
        let mut added = 0;

        for candidate in candidates {
            // A feasible candidate yields no useful cut
            if candidate.max_deviation.value < settings.term_tolerance {
                self.stats.feasible_points_skipped += 1;
                continue;
            }

            for (constraint, _) in
                select_violated_constraints(settings, model, &candidate.point)
            {
                let hyperplane = Hyperplane {
                    source_constraint: Some(constraint),
                    generated_point: candidate.point.clone(),
                    source: HyperplaneSource::OriginalSolution,
                };

                match log.register(settings, model, backend, hyperplane, lazy) {
                    RegisterOutcome::Added => added += 1,
                    RegisterOutcome::CapReached => {
                        self.stats.cuts_added += added;
                        return added;
                    }
                    _ => {}
                }
            }
        }

        self.stats.cuts_added += added;
        added
    }

    /// Statistics for this selector.
    pub fn stats(&self) -> &SolutionPointStats {
        &self.stats
    }
}
