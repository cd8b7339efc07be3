//! Configuration settings for the decomposition engine.

/// Strategy for generating supporting hyperplanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutStrategy {
    /// Extended Supporting Hyperplane: root search toward the feasible
    /// boundary before linearizing.
    #[default]
    Esh,

    /// Extended Cutting Plane: linearize directly at the candidate point.
    Ecp,
}

/// How the ESH root search treats multiple violated constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootsearchConstraintStrategy {
    /// One root search on the pointwise maximum of all violated constraints.
    #[default]
    AllAsMaxFunction,

    /// A separate root search for each violated constraint.
    IndividualConstraints,
}

/// Settings for the dual decomposition engine.
#[derive(Debug, Clone)]
pub struct DualSettings {
    // === Cut generation ===
    /// Hyperplane generation strategy.
    pub cut_strategy: CutStrategy,

    /// Constraint handling inside the ESH root search.
    pub rootsearch_constraint_strategy: RootsearchConstraintStrategy,

    /// Maximum hyperplanes added per outer iteration / callback invocation.
    pub max_hyperplanes_per_iteration: usize,

    /// Maximum constraints linearized per candidate point.
    pub max_constraints_per_point: usize,

    /// Additional violated constraints are linearized when their deviation is
    /// at least this fraction of the maximum deviation.
    pub constraint_selection_fraction: f64,

    /// Add at most one hyperplane per source constraint per iteration.
    pub unique_constraints: bool,

    /// A candidate whose maximum constraint deviation is below this value is
    /// considered feasible for the nonlinear model; no cut is generated.
    pub term_tolerance: f64,

    // === Integer cuts ===
    /// Generate no-good cuts for rejected discrete assignments.
    pub add_integer_cuts: bool,

    /// Allow integer cuts to be relaxed by the infeasibility repair.
    pub integer_cut_repair: bool,

    // === Single-tree behavior ===
    /// Generate hyperplanes at relaxed node solutions inside the tree search.
    pub add_hyperplanes_for_relaxed_solutions: bool,

    // === Relaxation phase ===
    /// Iteration budget for the initial continuous-relaxation phase.
    pub relaxation_iteration_limit: u64,

    /// Time budget (seconds) for the initial continuous-relaxation phase.
    pub relaxation_time_limit: f64,

    /// Force a relaxed iteration whenever this divides the iteration number
    /// (0 disables forcing).
    pub relaxation_frequency: u64,

    /// The relaxation phase ends once the relaxed max deviation drops below
    /// this value.
    pub relaxed_termination_tolerance: f64,

    /// A relaxed solution within this deviation is already usable as-is.
    pub relaxed_feasibility_epsilon: f64,

    // === Infeasibility repair ===
    /// Attempt to repair an infeasible master problem by relaxing cuts.
    pub repair_enabled: bool,

    /// Maximum number of repair attempts per solve.
    pub repair_iteration_limit: u64,

    /// Time limit (seconds) handed to the backend for each repair solve.
    pub repair_time_limit: f64,

    // === Root search ===
    /// Iteration cap for the scalar root search.
    pub rootsearch_max_iterations: usize,

    /// Interval width at which the root search stops.
    pub rootsearch_termination_tolerance: f64,

    // === Termination ===
    /// Outer iteration limit.
    pub iteration_limit: u64,

    /// Wall-clock time limit in seconds (None = unlimited).
    pub time_limit: Option<f64>,

    /// Absolute objective gap tolerance.
    pub absolute_gap_tolerance: f64,

    /// Relative objective gap tolerance.
    pub relative_gap_tolerance: f64,

    // === Solution handling ===
    /// Maximum solution-pool entries turned into candidate points per
    /// iteration.
    pub max_solutions_per_iteration: usize,

    // === Fixed-NLP primal improvement ===
    /// Solve a fixed-integer NLP to polish incumbents.
    pub use_fixed_nlp: bool,

    /// Run the fixed NLP at most every N accepted candidates.
    pub fixed_nlp_frequency: u64,
}

impl Default for DualSettings {
    fn default() -> Self {
        Self {
            cut_strategy: CutStrategy::default(),
            rootsearch_constraint_strategy: RootsearchConstraintStrategy::default(),
            max_hyperplanes_per_iteration: 200,
            max_constraints_per_point: 5,
            constraint_selection_fraction: 0.05,
            unique_constraints: false,
            term_tolerance: 1e-8,

            add_integer_cuts: false,
            integer_cut_repair: false,

            add_hyperplanes_for_relaxed_solutions: true,

            relaxation_iteration_limit: 200,
            relaxation_time_limit: 30.0,
            relaxation_frequency: 0,
            relaxed_termination_tolerance: 0.5,
            relaxed_feasibility_epsilon: 1e-6,

            repair_enabled: true,
            repair_iteration_limit: 100,
            repair_time_limit: 10.0,

            rootsearch_max_iterations: 100,
            rootsearch_termination_tolerance: 1e-12,

            iteration_limit: 200_000,
            time_limit: None,
            absolute_gap_tolerance: 1e-3,
            relative_gap_tolerance: 1e-3,

            max_solutions_per_iteration: 10,

            use_fixed_nlp: true,
            fixed_nlp_frequency: 10,
        }
    }
}

impl DualSettings {
    /// Set the cut strategy.
    pub fn with_cut_strategy(mut self, strategy: CutStrategy) -> Self {
        self.cut_strategy = strategy;
        self
    }

    /// Set the outer iteration limit.
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.iteration_limit = limit;
        self
    }

    /// Set the wall-clock time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// Set both gap tolerances.
    pub fn with_gap_tolerances(mut self, absolute: f64, relative: f64) -> Self {
        self.absolute_gap_tolerance = absolute;
        self.relative_gap_tolerance = relative;
        self
    }

    /// Enable or disable integer cuts.
    pub fn with_integer_cuts(mut self, enabled: bool) -> Self {
        self.add_integer_cuts = enabled;
        self
    }

    /// Disable the initial continuous-relaxation phase.
    pub fn without_relaxation_phase(mut self) -> Self {
        self.relaxation_iteration_limit = 0;
        self.relaxation_time_limit = 0.0;
        self
    }
}
