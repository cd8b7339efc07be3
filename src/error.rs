//! Error types for the decomposition engine.

use thiserror::Error;

/// Errors that can occur while driving the dual decomposition.
#[derive(Error, Debug)]
pub enum DualError {
    /// The master (MIP/LP) backend reported a solver-native error.
    #[error("Master backend error: {0}")]
    MasterBackend(String),

    /// The NLP backend reported a solver-native error.
    #[error("NLP backend error: {0}")]
    NlpBackend(String),

    /// Numerical issues while generating a cut.
    #[error("Cut generation failed: {0}")]
    CutGeneration(String),

    /// The master problem is infeasible and could not be repaired.
    #[error("Master problem infeasible and repair failed")]
    UnrepairedInfeasibility,

    /// A request referenced data that does not match the current model.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal engine error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for decomposition operations.
pub type DualResult<T> = Result<T, DualError>;
