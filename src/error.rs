use thiserror::Error;

/// Errors raised by misuse of the branch model or the search options.
///
/// Solver non-convergence is not one of these: it is reported through
/// [`Divergence`] and handled by the stress test as a terminal outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BranchError {
    /// Load set to a negative or non-finite active power.
    #[error("invalid load: active power must be finite and non-negative (got {0} MW)")]
    InvalidLoad(f64),

    /// Structurally invalid topology parameters.
    #[error("invalid topology: {0}")]
    Construction(String),

    /// Stress test options out of range.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// The power flow failed to reach a stable solution.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("power flow did not converge in {iterations} iterations (mismatch {mismatch:e})")]
pub struct Divergence {
    pub iterations: usize,
    pub mismatch: f64,
}

impl Divergence {
    pub fn new(iterations: usize, mismatch: f64) -> Self {
        Self {
            iterations,
            mismatch,
        }
    }
}
