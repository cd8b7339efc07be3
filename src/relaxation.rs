//! Relaxation activation state machine.
//!
//! Decides, once per outer iteration, whether the master problem is solved as
//! a continuous relaxation (`Active`) or with the discrete variables enforced
//! (`Inactive`). Once the LP step has finished the strategy stays `Inactive`
//! for the rest of the run, except for forced activations at the configured
//! frequency.

use crate::backend::MasterBackend;
use crate::env::Environment;
use crate::ledger::IterationKind;

const STAGNATION_STEPS: u64 = 10;
const STAGNATION_RELATIVE_CHANGE: f64 = 1e-6;

/// State of the relaxation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationState {
    /// Master is solved as a continuous relaxation.
    Active,

    /// Master is solved with discrete variables enforced.
    Inactive,
}

/// Standard relaxation strategy.
#[derive(Debug)]
pub struct RelaxationStrategy {
    lp_finished: bool,
}

impl RelaxationStrategy {
    /// Create the strategy and apply the initial state to the backend:
    /// `Active` iff both the relaxation iteration limit and time limit are
    /// positive.
    pub fn new(env: &Environment, backend: &mut dyn MasterBackend) -> Self {
        let mut strategy = Self { lp_finished: false };

        if env.settings.relaxation_iteration_limit > 0 && env.settings.relaxation_time_limit > 0.0 {
            strategy.set_active(env, backend);
        } else {
            strategy.set_inactive(env, backend);
        }

        strategy
    }

    /// Current state as implied by the backend's discrete-variable flag.
    pub fn state(&self, backend: &dyn MasterBackend) -> RelaxationState {
        if backend.discrete_variables_active() {
            RelaxationState::Inactive
        } else {
            RelaxationState::Active
        }
    }

    /// Problem form the next master solve will use.
    pub fn problem_kind(&self, backend: &dyn MasterBackend) -> IterationKind {
        if backend.discrete_variables_active() {
            IterationKind::DiscreteMaster
        } else {
            IterationKind::Relaxed
        }
    }

    /// Evaluate the transition rule for the current iteration.
    pub fn execute(&mut self, env: &Environment, backend: &mut dyn MasterBackend) {
        let frequency = env.settings.relaxation_frequency;
        if frequency != 0 {
            let current_number = env.ledger().current().map(|i| i.number).unwrap_or(0);
            if current_number % frequency == 0 {
                self.set_active(env, backend);
                return;
            }
        }

        if self.lp_finished
            || self.is_tolerance_reached(env)
            || env.is_gap_met()
            || self.is_iteration_limit_reached(env)
            || self.is_time_limit_reached(env)
            || self.is_relaxed_solution_epsilon_valid(env)
            || self.is_objective_stagnant(env)
        {
            self.set_inactive(env, backend);
        } else {
            self.set_active(env, backend);
        }
    }

    /// Whether the relaxation phase has completed.
    pub fn is_lp_step_finished(&self) -> bool {
        self.lp_finished
    }

    fn set_active(&mut self, env: &Environment, backend: &mut dyn MasterBackend) {
        if backend.discrete_variables_active() {
            let mut timing = env.timing();
            timing.stop("MIP");
            timing.start("LP");
            drop(timing);

            backend.activate_discrete_variables(false);

            if let Some(iter) = env.ledger().current_mut() {
                iter.kind = IterationKind::Relaxed;
            }
        }
    }

    fn set_inactive(&mut self, env: &Environment, backend: &mut dyn MasterBackend) {
        if !backend.discrete_variables_active() {
            let mut timing = env.timing();
            timing.stop("LP");
            timing.start("MIP");
            drop(timing);

            backend.activate_discrete_variables(true);

            if let Some(iter) = env.ledger().current_mut() {
                iter.kind = IterationKind::DiscreteMaster;
            }

            log::debug!("Relaxation step finished, enforcing discrete variables");
            self.lp_finished = true;
        }
    }

    fn is_iteration_limit_reached(&self, env: &Environment) -> bool {
        match env.ledger().previous() {
            Some(prev) => prev.number >= env.settings.relaxation_iteration_limit,
            None => env.settings.relaxation_iteration_limit == 0,
        }
    }

    fn is_time_limit_reached(&self, env: &Environment) -> bool {
        env.timing().elapsed("LP") >= env.settings.relaxation_time_limit
    }

    fn is_tolerance_reached(&self, env: &Environment) -> bool {
        match env.ledger().previous().and_then(|i| i.max_deviation) {
            Some(dev) => dev.value <= env.settings.relaxed_termination_tolerance,
            None => false,
        }
    }

    fn is_relaxed_solution_epsilon_valid(&self, env: &Environment) -> bool {
        let ledger = env.ledger();
        match ledger.previous() {
            Some(prev) if prev.kind == IterationKind::Relaxed => match prev.max_deviation {
                Some(dev) => dev.value <= env.settings.relaxed_feasibility_epsilon,
                None => false,
            },
            _ => false,
        }
    }

    fn is_objective_stagnant(&self, env: &Environment) -> bool {
        let ledger = env.ledger();

        let prev = match ledger.previous() {
            Some(prev) => prev,
            None => return false,
        };

        if prev.number < STAGNATION_STEPS {
            return false;
        }

        let earlier = match ledger.get(prev.number - STAGNATION_STEPS + 1) {
            Some(earlier) => earlier,
            None => return false,
        };

        if !prev.objective_value.is_finite() || !earlier.objective_value.is_finite() {
            return false;
        }

        let relative_change =
            ((prev.objective_value - earlier.objective_value) / prev.objective_value).abs();

        relative_change < STAGNATION_RELATIVE_CHANGE
    }
}
