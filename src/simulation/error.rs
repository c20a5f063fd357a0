//! Error types for the mechanism simulation
//!
//! Every failure is fatal to the run that raised it and carries the time/state
//! where it happened, so the caller can retry with a tighter solver setup

use thiserror::Error;

use super::states::State;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Mass matrix is singular, the parameter set cannot describe the mechanism
    #[error("degenerate mass matrix: det = {det:e}")]
    DegenerateSystem { det: f64 },

    /// Integrator could not advance the state within tolerance and budget
    #[error("integration did not converge at t = {t}: {reason} (after {steps} steps, state = {state})")]
    NonConvergence {
        t: f64,
        state: State,
        steps: usize,
        reason: String,
    },

    /// Configuration-time rejection of a mechanism that cannot be assembled:
    /// `R <= r`, non-positive masses or non-finite constants. Raised before any
    /// mass matrix is built; a bad determinant is reported as `DegenerateSystem`
    #[error("invalid mechanism parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("invalid time grid: {reason}")]
    InvalidTimeGrid { reason: String },

    #[error("invalid solver settings: {reason}")]
    InvalidSolver { reason: String },
}
